use std::io::{BufRead, ErrorKind};

use log::{debug, info, trace, warn};

use crate::HashMap;
use crate::element::ElementType;
use crate::field::{ElementDataHeader, FieldBlock, FieldHeaderError};
use crate::header::{FileType, MeshFormat, MeshFormatParseError};
use crate::io::*;
use crate::mesh::{Element, Mesh, MeshError, PhysicalRegion};

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("Data ends too early")]
    NotEnoughData,
    #[error("{0} section found before $MeshFormat")]
    MissingMeshFormat(&'static str),
    #[error("Cannot decode mesh format: {0}")]
    Header(#[from] MeshFormatParseError),
    #[error("Cannot decode element data header: {0}")]
    FieldHeader(#[from] FieldHeaderError),
    #[error("Bad record count in {section} at line {line_no}: {line:?}")]
    BadCount {
        section: &'static str,
        line_no: usize,
        line: String,
    },
    #[error("Bad element block header: type {element_type}, count {count}, {n_tags} tags")]
    BadBlockHeader {
        element_type: i32,
        count: i32,
        n_tags: i32,
    },
    #[error("Unknown element type code {0}")]
    UnknownElementType(i32),
    #[error("Invalid node or element id {0}")]
    InvalidId(i32),
    #[error("Insufficient number of entries in the $ElementData block: {field} time={time}")]
    FieldDataTruncated { field: String, time: f64 },
    #[error("Invalid row in {section} at line {line_no}: {line:?}")]
    InvalidRow {
        section: &'static str,
        line_no: usize,
        line: String,
    },
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// What to do with physical name and element data rows that have the
/// wrong number of tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RowPolicy {
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MshReaderSettings {
    pub row_policy: RowPolicy,
    /// Reject binary files whose byte order sentinel is not `1`.
    pub verify_byte_order: bool,
}

impl Default for MshReaderSettings {
    fn default() -> Self {
        Self {
            row_policy: RowPolicy::Lenient,
            verify_byte_order: true,
        }
    }
}

/// Upper bound on the tag count of a binary element block.
pub const MAX_ELEMENT_TAGS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementLayout {
    /// `$ELM`: `id type tag0 tag1 n_nodes nodes...`, ASCII only
    Legacy,
    /// `$Elements`: `id type n_tags tags... nodes...`
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Idle,
    MeshFormat,
    PhysicalNames { count_read: bool },
    Nodes { legacy: bool },
    Elements { layout: ElementLayout },
}

enum Marker {
    Enter(Section),
    ElementData,
    Leave,
}

impl Marker {
    fn parse(line: &str) -> Self {
        match line {
            "$MeshFormat" => Self::Enter(Section::MeshFormat),
            "$PhysicalNames" => Self::Enter(Section::PhysicalNames { count_read: false }),
            "$NOD" => Self::Enter(Section::Nodes { legacy: true }),
            "$Nodes" => Self::Enter(Section::Nodes { legacy: false }),
            "$ELM" => Self::Enter(Section::Elements {
                layout: ElementLayout::Legacy,
            }),
            "$Elements" => Self::Enter(Section::Elements {
                layout: ElementLayout::Current,
            }),
            "$ElementData" => Self::ElementData,
            _ => Self::Leave,
        }
    }
}

pub struct MshReader<'s> {
    stream: MshStream<&'s mut dyn BufRead>,
    settings: MshReaderSettings,
    format: Option<MeshFormat>,
    section: Section,
}

impl<'s> MshReader<'s> {
    pub fn init(read: &'s mut dyn BufRead) -> Self {
        Self::init_with_settings(Default::default(), read)
    }

    pub fn init_with_settings(
        settings: MshReaderSettings,
        read: &'s mut dyn BufRead,
    ) -> Self {
        Self {
            stream: MshStream::new(read),
            settings,
            format: None,
            section: Section::Idle,
        }
    }

    /// The `$MeshFormat` seen so far, if any.
    pub fn format(&self) -> Option<MeshFormat> {
        self.format
    }

    pub fn read_mesh(mut self) -> Result<Mesh, ReadError> {
        let mut mesh = Mesh::new();
        self.read_into(&mut mesh)?;
        Ok(mesh)
    }

    /// Reads the whole file and keeps only the physical region table.
    pub fn read_physical_names(mut self) -> Result<HashMap<String, PhysicalRegion>, ReadError> {
        let mut mesh = Mesh::new();
        self.read_into(&mut mesh)?;
        Ok(mesh.physical)
    }

    /// Reads sections until the end of input, adding their content to `mesh`.
    pub fn read_into(&mut self, mesh: &mut Mesh) -> Result<(), ReadError> {
        let mut line = String::new();
        while self.stream.next_line(&mut line)? {
            if line.starts_with('$') {
                match Marker::parse(&line) {
                    Marker::Enter(section) => self.section = section,
                    Marker::ElementData => {
                        self.section = Section::Idle;
                        self.read_element_data_block(mesh)?;
                    }
                    Marker::Leave => self.section = Section::Idle,
                }
                continue;
            }
            match self.section {
                Section::Idle => {}
                Section::MeshFormat => self.decode_mesh_format(&line)?,
                Section::PhysicalNames { count_read: false } => {
                    self.section = Section::PhysicalNames { count_read: true };
                }
                Section::PhysicalNames { count_read: true } => {
                    self.decode_physical_name(&line, mesh)?
                }
                Section::Nodes { legacy } => match self.encoding("$Nodes", legacy)? {
                    FileType::Ascii => self.decode_ascii_node(&line, mesh),
                    FileType::Binary => self.decode_binary_nodes(&line, mesh)?,
                },
                Section::Elements {
                    layout: ElementLayout::Legacy,
                } => self.decode_ascii_element(&line, ElementLayout::Legacy, mesh),
                Section::Elements {
                    layout: ElementLayout::Current,
                } => match self.encoding("$Elements", false)? {
                    FileType::Ascii => {
                        self.decode_ascii_element(&line, ElementLayout::Current, mesh)
                    }
                    FileType::Binary => self.decode_binary_elements(&line, mesh)?,
                },
            }
        }
        info!(
            "Read {} nodes, {} elements, {} physical regions",
            mesh.nodes.len(),
            mesh.elements.len(),
            mesh.physical.len()
        );
        Ok(())
    }

    fn encoding(&self, section: &'static str, legacy: bool) -> Result<FileType, ReadError> {
        match self.format {
            Some(format) => Ok(format.file_type),
            // version 1 files have no $MeshFormat and are always ASCII
            None if legacy => Ok(FileType::Ascii),
            None => Err(ReadError::MissingMeshFormat(section)),
        }
    }

    fn decode_mesh_format(&mut self, line: &str) -> Result<(), ReadError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 3 {
            trace!("Ignoring line {} in $MeshFormat", self.stream.line_no());
            return Ok(());
        }
        let format = MeshFormat::from_tokens(&tokens)?;
        debug!("Mesh format {}, {:?}", format.version, format.file_type);
        if format.is_binary() {
            let sentinel: [u8; 4] = self.stream.read_pod().map_err(binary_io)?;
            if self.settings.verify_byte_order {
                MeshFormat::verify_sentinel(sentinel)?;
            }
        }
        self.format = Some(format);
        Ok(())
    }

    fn decode_physical_name(&self, line: &str, mesh: &mut Mesh) -> Result<(), ReadError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let [dimension, id, name] = tokens[..] else {
            return self.skip_row("$PhysicalNames", line);
        };
        let (Ok(dimension), Ok(id)) = (dimension.parse::<u8>(), id.parse::<i32>()) else {
            return Err(self.invalid_row("$PhysicalNames", line));
        };
        if dimension > 3 {
            return Err(self.invalid_row("$PhysicalNames", line));
        }
        mesh.add_physical(name.trim_matches('"'), id, dimension);
        Ok(())
    }

    fn decode_ascii_node(&mut self, line: &str, mesh: &mut Mesh) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 4 {
            return;
        }
        let parsed = (
            tokens[0].parse::<u32>(),
            tokens[1].parse::<f64>(),
            tokens[2].parse::<f64>(),
            tokens[3].parse::<f64>(),
        );
        match parsed {
            (Ok(id), Ok(x), Ok(y), Ok(z)) => mesh.add_node(id, [x, y, z]),
            _ => {
                warn!(
                    "Node format error at line {}: {:?}, skipping rest of section",
                    self.stream.line_no(),
                    line
                );
                self.section = Section::Idle;
            }
        }
    }

    fn decode_binary_nodes(&mut self, line: &str, mesh: &mut Mesh) -> Result<(), ReadError> {
        let n_nodes = self.parse_count("$Nodes", line)?;
        for _ in 0..n_nodes {
            let record: NodeRecord = self.stream.read_pod().map_err(binary_io)?;
            let coords = record.coords;
            mesh.add_node(to_id(record.id)?, coords);
        }
        self.stream.read_pod::<u8>().map_err(binary_io)?;
        self.section = Section::Idle;
        Ok(())
    }

    fn decode_ascii_element(&mut self, line: &str, layout: ElementLayout, mesh: &mut Mesh) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let min_tokens = match layout {
            ElementLayout::Legacy => 6,
            ElementLayout::Current => 3,
        };
        if tokens.len() < min_tokens {
            return;
        }
        match parse_element_row(&tokens, layout) {
            Some((id, element)) => mesh.add_element(id, element),
            None => {
                warn!(
                    "Element format error at line {}: {:?}, skipping rest of section",
                    self.stream.line_no(),
                    line
                );
                self.section = Section::Idle;
            }
        }
    }

    fn decode_binary_elements(&mut self, line: &str, mesh: &mut Mesh) -> Result<(), ReadError> {
        let n_elements = self.parse_count("$Elements", line)?;
        let mut n_read = 0;
        while n_read < n_elements {
            let header: ElementBlockHeader = self.stream.read_pod().map_err(binary_io)?;
            let bad_header = || ReadError::BadBlockHeader {
                element_type: header.element_type,
                count: header.count,
                n_tags: header.n_tags,
            };
            let element_type = ElementType::from_code(header.element_type)
                .ok_or(ReadError::UnknownElementType(header.element_type))?;
            let count = usize::try_from(header.count).map_err(|_| bad_header())?;
            let n_tags = usize::try_from(header.n_tags)
                .ok()
                .filter(|n| *n <= MAX_ELEMENT_TAGS)
                .ok_or_else(bad_header)?;
            let record_len = 1 + n_tags + element_type.node_count();
            for _ in 0..count {
                let record: Vec<i32> = self.stream.read_pod_vec(record_len).map_err(binary_io)?;
                let nodes = record[1 + n_tags..]
                    .iter()
                    .map(|n| to_id(*n))
                    .collect::<Result<Vec<_>, _>>()?;
                let element = Element::new(
                    element_type.code(),
                    record[1..1 + n_tags].to_vec(),
                    nodes,
                );
                mesh.add_element(to_id(record[0])?, element);
            }
            n_read += count;
        }
        self.stream.read_pod::<u8>().map_err(binary_io)?;
        self.section = Section::Idle;
        Ok(())
    }

    /// Decodes one self-terminating `$ElementData` block.
    fn read_element_data_block(&mut self, mesh: &mut Mesh) -> Result<(), ReadError> {
        let mut lines: [String; ElementDataHeader::N_LINES] = Default::default();
        for line in lines.iter_mut() {
            if !self.stream.next_line(line)? {
                return Err(ReadError::NotEnoughData);
            }
        }
        let header = ElementDataHeader::parse(&lines)?;
        if mesh
            .field(&header.field)
            .is_some_and(|f| f.contains(header.time_index))
        {
            return Err(MeshError::DuplicateTimeIndex {
                field: header.field,
                time_index: header.time_index,
            }
            .into());
        }
        let mut block = FieldBlock::new(header.time, header.n_components);
        let mut line = String::new();
        // blank rows still count towards the declared row count
        for _ in 0..header.n_elements {
            if !self.stream.next_raw_line(&mut line)? {
                return Err(ReadError::NotEnoughData);
            }
            if line.starts_with('$') {
                return Err(ReadError::FieldDataTruncated {
                    field: header.field,
                    time: header.time,
                });
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != header.n_components.saturating_add(1) {
                self.skip_row("$ElementData", &line)?;
                continue;
            }
            let id = tokens[0].parse::<u32>();
            let values = tokens[1..]
                .iter()
                .map(|t| t.parse::<f64>())
                .collect::<Result<Vec<_>, _>>();
            let (Ok(id), Ok(values)) = (id, values) else {
                return Err(self.invalid_row("$ElementData", &line));
            };
            block.values.insert(id, values);
        }
        debug!(
            "Field {:?} time index {}: {} elements",
            header.field,
            header.time_index,
            block.values.len()
        );
        mesh.insert_field_block(&header.field, header.time_index, block)?;
        Ok(())
    }

    fn parse_count(&self, section: &'static str, line: &str) -> Result<usize, ReadError> {
        line.parse().map_err(|_| ReadError::BadCount {
            section,
            line_no: self.stream.line_no(),
            line: line.to_owned(),
        })
    }

    fn skip_row(&self, section: &'static str, line: &str) -> Result<(), ReadError> {
        match self.settings.row_policy {
            RowPolicy::Lenient => {
                trace!("Skipping row {} in {}", self.stream.line_no(), section);
                Ok(())
            }
            RowPolicy::Strict => Err(self.invalid_row(section, line)),
        }
    }

    fn invalid_row(&self, section: &'static str, line: &str) -> ReadError {
        ReadError::InvalidRow {
            section,
            line_no: self.stream.line_no(),
            line: line.to_owned(),
        }
    }
}

fn binary_io(e: std::io::Error) -> ReadError {
    if e.kind() == ErrorKind::UnexpectedEof {
        ReadError::NotEnoughData
    } else {
        ReadError::Io(e)
    }
}

fn to_id(raw: i32) -> Result<u32, ReadError> {
    u32::try_from(raw).map_err(|_| ReadError::InvalidId(raw))
}

fn parse_element_row(tokens: &[&str], layout: ElementLayout) -> Option<(u32, Element)> {
    let id = tokens[0].parse::<u32>().ok()?;
    let type_code = tokens[1].parse::<i32>().ok()?;
    let (tags, nodes) = match layout {
        ElementLayout::Legacy => {
            // tokens[4] repeats the node count
            tokens[4].parse::<usize>().ok()?;
            (&tokens[2..4], &tokens[5..])
        }
        ElementLayout::Current => {
            let n_tags = tokens[2].parse::<usize>().ok()?;
            if 3 + n_tags > tokens.len() {
                return None;
            }
            (&tokens[3..3 + n_tags], &tokens[3 + n_tags..])
        }
    };
    let tags = tags
        .iter()
        .map(|t| t.parse::<i32>().ok())
        .collect::<Option<Vec<_>>>()?;
    let nodes = nodes
        .iter()
        .map(|t| t.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?;
    Some((id, Element::new(type_code, tags, nodes)))
}
