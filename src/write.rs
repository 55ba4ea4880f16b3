use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::field::ElementDataHeader;
use crate::header::{FileType, MeshFormat};
use crate::io::*;
use crate::mesh::{Element, Mesh};

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("No mesh provided")]
    NoMesh,
    #[error("Element {id} has type code {type_code}, which has no binary layout")]
    UnknownElementType { id: u32, type_code: i32 },
    #[error("Element {id} has {found} nodes, its type needs {expected}")]
    NodeCountMismatch {
        id: u32,
        expected: usize,
        found: usize,
    },
    #[error("Id {0} does not fit a binary record")]
    IdOutOfRange(u32),
    #[error("Got {ids} element ids for {rows} value rows")]
    LengthMismatch { ids: usize, rows: usize },
    #[error("Value row {row} has {found} components, expected {expected}")]
    RaggedValues {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MshWriterSettings {
    /// Encoding of the node and element sections.
    ///
    /// Physical names are only written in ASCII files.
    pub file_type: FileType,
}

pub struct MshWriter<'s> {
    settings: MshWriterSettings,
    mesh: Option<&'s Mesh>,
}

impl<'s> MshWriter<'s> {
    pub fn new() -> Self {
        Self::new_with_settings(Default::default())
    }

    pub fn new_with_settings(settings: MshWriterSettings) -> Self {
        Self {
            settings,
            mesh: None,
        }
    }

    pub fn set_mesh(&mut self, mesh: &'s Mesh) {
        self.mesh = Some(mesh);
    }

    pub fn with_mesh(mut self, mesh: &'s Mesh) -> Self {
        self.set_mesh(mesh);
        self
    }

    pub fn write_to(self, write: &mut dyn Write) -> Result<(), WriteError> {
        let mesh = self.mesh.ok_or(WriteError::NoMesh)?;
        match self.settings.file_type {
            FileType::Ascii => write_ascii(mesh, write),
            FileType::Binary => write_binary(mesh, write),
        }
    }
}

impl Default for MshWriter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn write_ascii(mesh: &Mesh, write: &mut dyn Write) -> Result<(), WriteError> {
    write_format_section(write, FileType::Ascii)?;

    let mut names: Vec<&String> = mesh.physical.keys().collect();
    names.sort();
    writeln!(write, "$PhysicalNames\n{}", names.len())?;
    for name in names {
        let region = mesh.physical[name];
        writeln!(write, "{} {} \"{}\"", region.dimension, region.id, name)?;
    }
    writeln!(write, "$EndPhysicalNames")?;

    let node_ids = mesh.sorted_node_ids();
    writeln!(write, "$Nodes\n{}", node_ids.len())?;
    for id in node_ids {
        let [x, y, z] = mesh.nodes[&id];
        writeln!(write, "{} {} {} {}", id, x, y, z)?;
    }
    writeln!(write, "$EndNodes")?;

    let element_ids = mesh.sorted_element_ids();
    writeln!(write, "$Elements\n{}", element_ids.len())?;
    for id in element_ids {
        let element = &mesh.elements[&id];
        write!(write, "{} {} {}", id, element.type_code, element.tags.len())?;
        for tag in &element.tags {
            write!(write, " {}", tag)?;
        }
        for node in &element.nodes {
            write!(write, " {}", node)?;
        }
        writeln!(write)?;
    }
    writeln!(write, "$EndElements")?;
    Ok(())
}

fn write_binary(mesh: &Mesh, write: &mut dyn Write) -> Result<(), WriteError> {
    write_format_section(write, FileType::Binary)?;

    let node_ids = mesh.sorted_node_ids();
    writeln!(write, "$Nodes\n{}", node_ids.len())?;
    for id in node_ids {
        let record = NodeRecord {
            id: to_i32(id)?,
            coords: mesh.nodes[&id],
        };
        write_pod(write, &record)?;
    }
    writeln!(write, "\n$EndNodes")?;

    let element_ids = mesh.sorted_element_ids();
    for id in &element_ids {
        check_binary_element(*id, &mesh.elements[id])?;
    }
    writeln!(write, "$Elements\n{}", element_ids.len())?;
    let mut record = vec![];
    for run in element_ids.chunk_by(|a, b| {
        same_block(&mesh.elements[a], &mesh.elements[b])
    }) {
        let first = &mesh.elements[&run[0]];
        let header = ElementBlockHeader {
            element_type: first.type_code,
            count: run.len() as i32,
            n_tags: first.tags.len() as i32,
        };
        write_pod(write, &header)?;
        for id in run {
            let element = &mesh.elements[id];
            record.clear();
            record.push(to_i32(*id)?);
            record.extend_from_slice(&element.tags);
            for node in &element.nodes {
                record.push(to_i32(*node)?);
            }
            write_pod_slice(write, &record)?;
        }
    }
    writeln!(write, "\n$EndElements")?;
    Ok(())
}

fn write_format_section(write: &mut dyn Write, file_type: FileType) -> std::io::Result<()> {
    let format = MeshFormat::current(file_type);
    writeln!(write, "$MeshFormat\n{}", format.to_line())?;
    if format.is_binary() {
        write.write_all(&MeshFormat::sentinel_bytes())?;
        writeln!(write)?;
    }
    writeln!(write, "$EndMeshFormat")
}

fn check_binary_element(id: u32, element: &Element) -> Result<(), WriteError> {
    let element_type = element
        .element_type()
        .ok_or(WriteError::UnknownElementType {
            id,
            type_code: element.type_code,
        })?;
    if element.nodes.len() != element_type.node_count() {
        return Err(WriteError::NodeCountMismatch {
            id,
            expected: element_type.node_count(),
            found: element.nodes.len(),
        });
    }
    Ok(())
}

fn same_block(a: &Element, b: &Element) -> bool {
    a.type_code == b.type_code && a.tags.len() == b.tags.len()
}

fn to_i32(id: u32) -> Result<i32, WriteError> {
    i32::try_from(id).map_err(|_| WriteError::IdOutOfRange(id))
}

/// Writes one `$ElementData` block at time `0`, time index `0`.
///
/// `values` holds one row per entry of `ele_ids`; all rows must have the
/// same length, which becomes the component count.
pub fn write_element_data<R: AsRef<[f64]>>(
    write: &mut dyn Write,
    ele_ids: &[u32],
    name: &str,
    values: &[R],
) -> Result<(), WriteError> {
    if ele_ids.len() != values.len() {
        return Err(WriteError::LengthMismatch {
            ids: ele_ids.len(),
            rows: values.len(),
        });
    }
    let n_components = values.first().map_or(0, |row| row.as_ref().len());
    for (row, v) in values.iter().enumerate() {
        if v.as_ref().len() != n_components {
            return Err(WriteError::RaggedValues {
                row,
                expected: n_components,
                found: v.as_ref().len(),
            });
        }
    }
    let header = ElementDataHeader {
        field: name.to_owned(),
        time: 0.0,
        time_index: 0,
        n_components,
        n_elements: values.len(),
    };
    writeln!(write, "$ElementData")?;
    header.write_to(write)?;
    for (id, row) in ele_ids.iter().zip(values) {
        write!(write, "{}", id)?;
        for v in row.as_ref() {
            write!(write, " {}", v)?;
        }
        writeln!(write)?;
    }
    writeln!(write, "$EndElementData")?;
    Ok(())
}

/// Writes an ASCII format header followed by one `$ElementData` block per
/// field, in the order given.
pub fn write_fields<'a, S, R, I>(
    write: &mut dyn Write,
    ele_ids: &[u32],
    fields: I,
) -> Result<(), WriteError>
where
    S: AsRef<str>,
    R: AsRef<[f64]> + 'a,
    I: IntoIterator<Item = (S, &'a [R])>,
{
    write_format_section(write, FileType::Ascii)?;
    for (name, values) in fields {
        write_element_data(write, ele_ids, name.as_ref(), values)?;
    }
    Ok(())
}

pub fn write_fields_file<'a, S, R, I>(
    path: impl AsRef<Path>,
    ele_ids: &[u32],
    fields: I,
) -> Result<(), WriteError>
where
    S: AsRef<str>,
    R: AsRef<[f64]> + 'a,
    I: IntoIterator<Item = (S, &'a [R])>,
{
    let mut file = BufWriter::new(File::create(path)?);
    write_fields(&mut file, ele_ids, fields)?;
    file.flush()?;
    Ok(())
}
