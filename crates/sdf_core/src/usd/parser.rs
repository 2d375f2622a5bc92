//! USDA (ASCII) file parser.
//!
//! This module provides line-by-line parsing of USDA text files.
//! The parser is intentionally simple and handles the subset of USD needed to
//! index stages: layer metadata, composition arcs, prim hierarchy and
//! material shader networks.
//!
//! # Supported Syntax
//!
//! - Header metadata: `upAxis`, `metersPerUnit`, `defaultPrim`, `subLayers`
//! - `def Type "Name" (metadata) { ... }` and typeless `def "Name" { ... }`
//! - Prim metadata: `references`, `payload` (with `prepend`/`append`), `kind`
//! - `def Material` / `def Shader` networks:
//!   - `uniform token info:id = "UsdPreviewSurface"`
//!   - `color3f inputs:diffuseColor = (1, 0, 0)`
//!   - `float inputs:roughness = 0.4`
//!   - `asset inputs:file = @./albedo.png@`
//!   - `color3f inputs:diffuseColor.connect = </Looks/Mat/Tex.outputs:rgb>`
//!   - `token outputs:surface.connect = </Looks/Mat/Surface.outputs:surface>`
//! - `over` and `class` prims are skipped

use std::collections::VecDeque;

use sdf_math::Vec3;
use thiserror::Error;

use super::types::*;

/// Errors that can occur during USDA parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unexpected end of file")]
    UnexpectedEof,

    #[error("Invalid number format: {0}")]
    InvalidNumber(String),

    #[error("Unclosed block starting at line {0}")]
    UnclosedBlock(usize),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Metadata found in a prim's parentheses.
#[derive(Default)]
struct PrimMetadata {
    references: Vec<UsdReference>,
    kind: Option<String>,
}

/// USDA file parser.
pub struct UsdaParser {
    lines: VecDeque<(usize, String)>,
    current_line: usize,
}

impl UsdaParser {
    /// Create a new parser from file contents.
    pub fn new(content: &str) -> Self {
        let lines: VecDeque<_> = content
            .lines()
            .enumerate()
            .map(|(i, s)| (i + 1, s.to_string()))
            .collect();

        Self {
            lines,
            current_line: 0,
        }
    }

    /// Parse the USDA content and return the layer.
    pub fn parse(&mut self) -> ParseResult<UsdLayer> {
        let mut layer = UsdLayer {
            metadata: self.parse_header()?,
            prims: Vec::new(),
        };

        // Parse root prims
        while let Some((line_num, line)) = self.lines.front() {
            if line.trim() == "}" {
                return Err(ParseError::Parse {
                    line: *line_num,
                    message: "Unexpected '}' at root level".to_string(),
                });
            }
            if let Some(prim) = self.parse_prim("")? {
                layer.prims.push(prim);
            }
        }

        Ok(layer)
    }

    /// Parse the layer header: comments and the metadata block in parentheses.
    fn parse_header(&mut self) -> ParseResult<LayerMetadata> {
        let mut metadata = LayerMetadata::default();

        while let Some((line_num, line)) = self.lines.front() {
            let trimmed = line.trim();
            if trimmed.starts_with('#') || trimmed.is_empty() {
                self.lines.pop_front();
                continue;
            }
            if !trimmed.starts_with('(') {
                break;
            }

            let start_line = *line_num;
            self.current_line = start_line;
            let block = self.collect_parenthesized()?;
            self.apply_layer_metadata(&block, &mut metadata, start_line)?;
            break;
        }

        Ok(metadata)
    }

    /// Consume lines from an opening `(` until parentheses balance.
    ///
    /// The first line must be the one holding the opening paren. Returns the
    /// collected text with the outer parentheses still in place.
    fn collect_parenthesized(&mut self) -> ParseResult<String> {
        let mut block = String::new();
        let mut depth: i64 = 0;

        loop {
            let (num, line) = self.lines.pop_front().ok_or(ParseError::UnexpectedEof)?;
            self.current_line = num;
            depth += line.matches('(').count() as i64;
            depth -= line.matches(')').count() as i64;
            block.push_str(&line);
            block.push('\n');
            if depth <= 0 {
                return Ok(block);
            }
        }
    }

    /// Extract known layer metadata from a header block.
    fn apply_layer_metadata(
        &self,
        block: &str,
        metadata: &mut LayerMetadata,
        start_line: usize,
    ) -> ParseResult<()> {
        for (offset, line) in block.lines().enumerate() {
            let line_num = start_line + offset;
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim().trim_start_matches('(').trim();
            let value = value.trim().trim_end_matches(')').trim();

            match key {
                "upAxis" => {
                    let token = unquote(value);
                    let axis = token.parse::<UpAxis>().map_err(|_| ParseError::Parse {
                        line: line_num,
                        message: format!("Invalid upAxis: {}", token),
                    })?;
                    metadata.up_axis = Some(axis);
                }
                "metersPerUnit" => {
                    let number = value
                        .parse::<f64>()
                        .map_err(|_| ParseError::InvalidNumber(value.to_string()))?;
                    metadata.meters_per_unit = Some(number);
                }
                "defaultPrim" => {
                    metadata.default_prim = Some(unquote(value).to_string());
                }
                _ => {}
            }
        }

        if let Some(list) = list_value(block, "subLayers") {
            metadata.sub_layers = self
                .parse_asset_list(list)?
                .into_iter()
                .map(|(asset, _)| asset)
                .collect();
        }

        Ok(())
    }

    /// Parse a single prim and its children.
    fn parse_prim(&mut self, parent_path: &str) -> ParseResult<Option<UsdPrim>> {
        // Get next non-empty line
        let (line_num, line) = loop {
            match self.lines.pop_front() {
                Some((num, line)) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() && !trimmed.starts_with('#') {
                        self.current_line = num;
                        break (num, line);
                    }
                }
                None => return Ok(None),
            }
        };

        let trimmed = line.trim();

        // Check for closing brace
        if trimmed == "}" {
            // Put it back for the caller to handle
            self.lines.push_front((line_num, line));
            return Ok(None);
        }

        if is_prim_header(trimmed) {
            let trimmed = trimmed.to_string();
            return self.parse_def(&trimmed, parent_path, line_num);
        }

        // Attributes outside a prim block carry nothing we index
        self.skip_attribute(trimmed, line_num)?;
        Ok(None)
    }

    /// Parse a `def Type "Name"` block (also `over` / `class`, which are skipped).
    fn parse_def(
        &mut self,
        line: &str,
        parent_path: &str,
        start_line: usize,
    ) -> ParseResult<Option<UsdPrim>> {
        let (specifier, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim_start();

        // Typeless prims start directly with the quoted name
        let prim_type = if rest.starts_with('"') {
            ""
        } else {
            rest.split_whitespace().next().unwrap_or("")
        };

        // Find the name (quoted string)
        let name = quoted(rest).ok_or_else(|| ParseError::Parse {
            line: start_line,
            message: format!("Missing prim name in: {}", line),
        })?;

        let path = if parent_path.is_empty() {
            format!("/{}", name)
        } else {
            format!("{}/{}", parent_path, name)
        };

        // Metadata can be: inline, multi-line starting on the def line, or on the next line
        let after_name = &rest[rest.find('"').map_or(0, |q| q + name.len() + 2)..];
        let metadata_block = if let Some(paren_start) = after_name.find('(') {
            let opened = after_name[paren_start..].matches('(').count();
            let closed = after_name[paren_start..].matches(')').count();
            if closed >= opened {
                Some(after_name[paren_start..].to_string())
            } else {
                // Multi-line metadata started on def line: def Type "Name" (\n  metadata\n)
                let mut block = after_name[paren_start..].to_string();
                block.push('\n');
                block.push_str(&self.collect_until_balanced(opened - closed)?);
                Some(block)
            }
        } else {
            // Check for metadata on next line (standalone parentheses)
            let next_is_metadata = matches!(
                self.lines.front(),
                Some((_, next)) if next.trim().starts_with('(')
            );
            if next_is_metadata {
                Some(self.collect_parenthesized()?)
            } else {
                None
            }
        };

        let metadata = match &metadata_block {
            Some(block) => self.parse_prim_metadata(block)?,
            None => PrimMetadata::default(),
        };

        // Whatever follows the metadata may open, or open and close, the body
        let tail = match &metadata_block {
            Some(block) => block.rsplit(')').next().unwrap_or(""),
            None => after_name,
        };

        // Single line prims: def Type "Name" (refs) { }
        let inline_body = tail
            .find('{')
            .map(|open| tail[open..].contains('}'))
            .unwrap_or(false);

        if !tail.contains('{') {
            self.expect_opening_brace(start_line)?;
        }

        if specifier != "def" {
            if !inline_body {
                self.skip_block(start_line)?;
            }
            return Ok(Some(UsdPrim::Unknown(prim_type.to_string())));
        }

        // Parse prim content based on type
        let prim = match prim_type {
            "Material" => {
                let mut material = UsdMaterial {
                    path: path.clone(),
                    name: name.to_string(),
                    references: metadata.references,
                    ..Default::default()
                };
                if !inline_body {
                    self.parse_material_content(&mut material, start_line)?;
                }
                UsdPrim::Material(material)
            }
            "Shader" => {
                let mut shader = UsdShader {
                    path: path.clone(),
                    name: name.to_string(),
                    ..Default::default()
                };
                if !inline_body {
                    self.parse_shader_content(&mut shader, start_line)?;
                }
                UsdPrim::Shader(shader)
            }
            _ => {
                let mut group = UsdGroup {
                    path: path.clone(),
                    name: name.to_string(),
                    type_name: prim_type.to_string(),
                    kind: metadata.kind,
                    references: metadata.references,
                    children: Vec::new(),
                };
                if !inline_body {
                    group.children = self.parse_children(&path, start_line)?;
                }
                UsdPrim::Group(group)
            }
        };

        Ok(Some(prim))
    }

    /// Consume lines until `depth` open parentheses are closed.
    fn collect_until_balanced(&mut self, depth: usize) -> ParseResult<String> {
        let mut depth = depth as i64;
        let mut block = String::new();

        while depth > 0 {
            let (num, line) = self.lines.pop_front().ok_or(ParseError::UnexpectedEof)?;
            self.current_line = num;
            depth += line.matches('(').count() as i64;
            depth -= line.matches(')').count() as i64;
            block.push_str(&line);
            block.push('\n');
        }

        Ok(block)
    }

    /// Extract references, payloads and kind from a prim metadata block.
    fn parse_prim_metadata(&self, block: &str) -> ParseResult<PrimMetadata> {
        let mut metadata = PrimMetadata::default();

        for (keyword, kind) in [("references", ArcKind::Reference), ("payload", ArcKind::Payload)] {
            for statement in arc_statements(block, keyword) {
                for (asset_path, target_prim_path) in self.parse_asset_list(statement)? {
                    metadata.references.push(UsdReference {
                        asset_path,
                        target_prim_path,
                        kind,
                    });
                }
            }
        }

        for line in block.lines() {
            if let Some((key, value)) = line.split_once('=') {
                if key.trim().trim_start_matches('(').trim() == "kind" {
                    metadata.kind = Some(unquote(value.trim().trim_end_matches(')').trim()).to_string());
                }
            }
        }

        Ok(metadata)
    }

    /// Parse `@asset@</Prim>` entries of a reference, payload or sublayer list.
    ///
    /// Internal references (`</Prim>` without an asset) are ignored.
    fn parse_asset_list(&self, text: &str) -> ParseResult<Vec<(String, Option<String>)>> {
        if text.matches('@').count() % 2 != 0 {
            return Err(ParseError::Parse {
                line: self.current_line,
                message: format!("Invalid reference syntax: {}", text.trim()),
            });
        }

        let mut result = Vec::new();
        let mut rest = text;

        while let Some(start) = rest.find('@') {
            let after = &rest[start + 1..];
            let end = after.find('@').ok_or_else(|| ParseError::Parse {
                line: self.current_line,
                message: format!("Unterminated asset path: {}", text.trim()),
            })?;
            let asset_path = after[..end].to_string();
            rest = &after[end + 1..];

            // Look for target prim path after the closing @
            let mut target_prim = None;
            let tail = rest.trim_start();
            if let Some(stripped) = tail.strip_prefix('<') {
                if let Some(prim_end) = stripped.find('>') {
                    target_prim = Some(stripped[..prim_end].to_string());
                    rest = &stripped[prim_end + 1..];
                }
            }

            if !asset_path.is_empty() {
                result.push((asset_path, target_prim));
            }
        }

        Ok(result)
    }

    /// Expect and consume an opening brace.
    fn expect_opening_brace(&mut self, start_line: usize) -> ParseResult<()> {
        // The brace might be on the same line as def, or on the next line
        // We've already consumed the def line, so check if we need to find the brace
        while let Some((_num, line)) = self.lines.front() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                self.lines.pop_front();
                continue;
            }
            if trimmed == "{" {
                self.lines.pop_front();
                return Ok(());
            }
            // Brace closed a metadata block on the previous line
            return Ok(());
        }

        Err(ParseError::Parse {
            line: start_line,
            message: "Expected opening brace".to_string(),
        })
    }

    /// Skip a block (consume until matching closing brace).
    fn skip_block(&mut self, start_line: usize) -> ParseResult<()> {
        let mut depth = 1;

        while depth > 0 {
            match self.lines.pop_front() {
                Some((_, line)) => {
                    depth += line.matches('{').count();
                    depth -= line.matches('}').count();
                }
                None => return Err(ParseError::UnclosedBlock(start_line)),
            }
        }

        Ok(())
    }

    /// Skip the continuation of an attribute line: metadata in parentheses,
    /// multi-line arrays and dictionary or time-sample blocks.
    fn skip_attribute(&mut self, line: &str, line_num: usize) -> ParseResult<()> {
        let braces = line.matches('{').count() as i64 - line.matches('}').count() as i64;
        if braces > 0 {
            return self.skip_block(line_num);
        }

        let parens = line.matches('(').count() as i64 - line.matches(')').count() as i64;
        let brackets = line.matches('[').count() as i64 - line.matches(']').count() as i64;
        if parens > 0 || brackets > 0 {
            let mut parens = parens;
            let mut brackets = brackets;
            while parens > 0 || brackets > 0 {
                let (num, next) = self
                    .lines
                    .pop_front()
                    .ok_or(ParseError::UnclosedBlock(line_num))?;
                self.current_line = num;
                parens += next.matches('(').count() as i64 - next.matches(')').count() as i64;
                brackets += next.matches('[').count() as i64 - next.matches(']').count() as i64;
            }
        }

        Ok(())
    }

    /// Parse the children of a grouping prim, skipping its attributes.
    fn parse_children(&mut self, path: &str, start_line: usize) -> ParseResult<Vec<UsdPrim>> {
        let mut children = Vec::new();

        loop {
            let (line_num, line) = match self.lines.pop_front() {
                Some(x) => x,
                None => return Err(ParseError::UnclosedBlock(start_line)),
            };
            self.current_line = line_num;

            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if trimmed == "}" {
                break;
            }

            // Check for child prim FIRST
            if is_prim_header(trimmed) {
                self.lines.push_front((line_num, line));
                if let Some(child) = self.parse_prim(path)? {
                    children.push(child);
                }
                continue;
            }

            self.skip_attribute(trimmed, line_num)?;
        }

        Ok(children)
    }

    /// Parse Material content (surface output and shader network).
    fn parse_material_content(&mut self, material: &mut UsdMaterial, start_line: usize) -> ParseResult<()> {
        let path = material.path.clone();

        loop {
            let (line_num, line) = match self.lines.pop_front() {
                Some(x) => x,
                None => return Err(ParseError::UnclosedBlock(start_line)),
            };
            self.current_line = line_num;

            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if trimmed == "}" {
                break;
            }

            if is_prim_header(trimmed) {
                self.lines.push_front((line_num, line));
                if let Some(child) = self.parse_prim(&path)? {
                    material.children.push(child);
                }
                continue;
            }

            // token outputs:surface.connect = </Looks/Mat/Surface.outputs:surface>
            if trimmed.contains("outputs:surface.connect") {
                if let Some((prim, _)) = self.parse_connection(trimmed)? {
                    material.surface = Some(prim);
                }
                continue;
            }

            self.skip_attribute(trimmed, line_num)?;
        }

        Ok(())
    }

    /// Parse Shader content (`info:id` and `inputs:*`).
    fn parse_shader_content(&mut self, shader: &mut UsdShader, start_line: usize) -> ParseResult<()> {
        loop {
            let (line_num, line) = match self.lines.pop_front() {
                Some(x) => x,
                None => return Err(ParseError::UnclosedBlock(start_line)),
            };
            self.current_line = line_num;

            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if trimmed == "}" {
                break;
            }

            // uniform token info:id = "UsdPreviewSurface"
            if trimmed.contains("info:id") && trimmed.contains('=') {
                if let Some((_, value)) = trimmed.split_once('=') {
                    shader.id = Some(unquote(value.trim()).to_string());
                }
                continue;
            }

            if let Some(input) = self.parse_shader_input(trimmed)? {
                shader.inputs.push(input);
            }

            self.skip_attribute(trimmed, line_num)?;
        }

        Ok(())
    }

    /// Parse an `inputs:name = value` or `inputs:name.connect = <path>` line.
    fn parse_shader_input(&self, line: &str) -> ParseResult<Option<(String, ShaderValue)>> {
        let Some(input_pos) = line.find("inputs:") else {
            return Ok(None);
        };
        let Some(eq_pos) = line.find('=') else {
            // Declaration without a value
            return Ok(None);
        };
        if eq_pos < input_pos {
            return Ok(None);
        }

        let name = line[input_pos + "inputs:".len()..eq_pos].trim();

        if let Some(name) = name.strip_suffix(".connect") {
            return Ok(self
                .parse_connection(line)?
                .map(|(prim, output)| (name.to_string(), ShaderValue::Connection { prim, output })));
        }

        let value = line[eq_pos + 1..].trim();
        let parsed = if value.starts_with('@') {
            let asset = self
                .parse_asset_list(value)?
                .into_iter()
                .next()
                .map(|(asset, _)| asset)
                .unwrap_or_default();
            ShaderValue::Asset(asset)
        } else if value.starts_with('(') {
            let inner_end = value.find(')').unwrap_or(value.len());
            if value[..inner_end].matches(',').count() == 2 {
                ShaderValue::Vec3(self.parse_inline_vec3(value)?)
            } else {
                ShaderValue::Token(value[..(inner_end + 1).min(value.len())].to_string())
            }
        } else if value.starts_with('"') {
            ShaderValue::Token(unquote(value).to_string())
        } else {
            // First token only, metadata may follow
            let number = value.split_whitespace().next().unwrap_or("");
            match number.parse::<f32>() {
                Ok(n) => ShaderValue::Float(n),
                Err(_) if number.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.') => {
                    return Err(ParseError::InvalidNumber(number.to_string()));
                }
                Err(_) => ShaderValue::Token(number.to_string()),
            }
        };

        Ok(Some((name.to_string(), parsed)))
    }

    /// Parse a connection target like `</Looks/Mat/Tex.outputs:rgb>`.
    /// Returns the prim path and the output name.
    fn parse_connection(&self, line: &str) -> ParseResult<Option<(String, String)>> {
        let eq_pos = line.find('=').unwrap_or(0);
        let after_eq = &line[eq_pos..];

        let (Some(start), Some(end)) = (after_eq.find('<'), after_eq.find('>')) else {
            return Err(ParseError::Parse {
                line: self.current_line,
                message: format!("Invalid connection: {}", line),
            });
        };
        if end < start {
            return Err(ParseError::Parse {
                line: self.current_line,
                message: format!("Invalid connection: {}", line),
            });
        }

        let target = &after_eq[start + 1..end];
        Ok(Some(match target.split_once(".outputs:") {
            Some((prim, output)) => (prim.to_string(), output.to_string()),
            None => (target.to_string(), String::new()),
        }))
    }

    /// Parse an inline Vec3 value like (1, 2, 3).
    fn parse_inline_vec3(&self, value: &str) -> ParseResult<Vec3> {
        let start = value.find('(').ok_or_else(|| ParseError::Parse {
            line: self.current_line,
            message: format!("Expected '(' in: {}", value),
        })?;

        let end = value.find(')').ok_or_else(|| ParseError::Parse {
            line: self.current_line,
            message: format!("Expected ')' in: {}", value),
        })?;

        let inner = &value[start + 1..end];
        let parts: Vec<&str> = inner.split(',').collect();

        if parts.len() != 3 {
            return Err(ParseError::Parse {
                line: self.current_line,
                message: format!("Expected 3 components, got {}", parts.len()),
            });
        }

        let x = parts[0].trim().parse::<f32>().map_err(|_| ParseError::InvalidNumber(parts[0].to_string()))?;
        let y = parts[1].trim().parse::<f32>().map_err(|_| ParseError::InvalidNumber(parts[1].to_string()))?;
        let z = parts[2].trim().parse::<f32>().map_err(|_| ParseError::InvalidNumber(parts[2].to_string()))?;

        Ok(Vec3::new(x, y, z))
    }
}

/// Whether a line starts a prim definition.
fn is_prim_header(line: &str) -> bool {
    ["def ", "over ", "class "].iter().any(|s| line.starts_with(s))
}

/// The first double-quoted string in `text`.
fn quoted(text: &str) -> Option<&str> {
    let start = text.find('"')?;
    let after = &text[start + 1..];
    let end = after.find('"')?;
    Some(&after[..end])
}

fn unquote(text: &str) -> &str {
    quoted(text).unwrap_or(text)
}

/// The value of every `[prepend|append] keyword = ...` statement in `block`.
///
/// List values run to the matching `]`, single values to the end of the line.
/// `delete` list-ops are ignored.
fn arc_statements<'a>(block: &'a str, keyword: &str) -> Vec<&'a str> {
    let mut statements = Vec::new();
    let mut offset = 0;

    while let Some(found) = block[offset..].find(keyword) {
        let pos = offset + found;
        offset = pos + keyword.len();

        let line_start = block[..pos].rfind('\n').map_or(0, |i| i + 1);
        let prefix = block[line_start..pos].trim().trim_start_matches('(').trim();
        if !matches!(prefix, "" | "prepend" | "append" | "add" | "reorder") {
            continue;
        }

        let after = &block[offset..];
        let Some(eq) = after.find('=') else {
            break;
        };
        if !after[..eq].trim().is_empty() {
            continue;
        }

        let value = after[eq + 1..].trim_start();
        let value_start = block.len() - value.len();
        let value_len = if value.starts_with('[') {
            value.find(']').map_or(value.len(), |end| end + 1)
        } else {
            value.find('\n').unwrap_or(value.len())
        };

        statements.push(&block[value_start..value_start + value_len]);
        offset = value_start + value_len;
    }

    statements
}

/// The `[...]` value of `keyword = [...]` in `block`, if present.
fn list_value<'a>(block: &'a str, keyword: &str) -> Option<&'a str> {
    arc_statements(block, keyword).into_iter().next()
}

/// Parse a USDA string and return the layer.
pub fn parse_usda(content: &str) -> ParseResult<UsdLayer> {
    let mut parser = UsdaParser::new(content);
    parser.parse()
}
