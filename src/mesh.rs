use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::element::ElementType;
use crate::field::{FieldBlock, FieldData};
use crate::read::{MshReader, MshReaderSettings, ReadError};
use crate::write::{MshWriter, MshWriterSettings, WriteError};
use crate::{HashMap, HashSet};

pub type Point = [f64; 3];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Raw type code, see [`ElementType`].
    pub type_code: i32,
    /// By convention the first tag is the physical region id.
    pub tags: Vec<i32>,
    pub nodes: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhysicalRegion {
    pub id: i32,
    pub dimension: u8,
}

/// Nodes, elements, named regions and element fields of one mesh file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub nodes: HashMap<u32, Point>,
    pub elements: HashMap<u32, Element>,
    pub physical: HashMap<String, PhysicalRegion>,
    pub element_data: HashMap<String, FieldData>,
}

#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("No physical region named {0:?}")]
    UnknownRegion(String),
    #[error("Physical region {name:?} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        name: String,
        expected: u8,
        found: u8,
    },
    #[error("Field {field:?} already has a block with time index {time_index}")]
    DuplicateTimeIndex { field: String, time_index: i32 },
}

impl Element {
    pub fn new(type_code: i32, tags: Vec<i32>, nodes: Vec<u32>) -> Self {
        Self {
            type_code,
            tags,
            nodes,
        }
    }

    pub fn element_type(&self) -> Option<ElementType> {
        ElementType::from_code(self.type_code)
    }

    pub fn region_id(&self) -> Option<i32> {
        self.tags.first().copied()
    }
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a mesh file with default settings.
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        Self::read_file_with_settings(path, Default::default())
    }

    pub fn read_file_with_settings(
        path: impl AsRef<Path>,
        settings: MshReaderSettings,
    ) -> Result<Self, ReadError> {
        let mut file = BufReader::new(File::open(path)?);
        MshReader::init_with_settings(settings, &mut file).read_mesh()
    }

    pub fn write_file(
        &self,
        path: impl AsRef<Path>,
        settings: MshWriterSettings,
    ) -> Result<(), WriteError> {
        let mut file = BufWriter::new(File::create(path)?);
        MshWriter::new_with_settings(settings)
            .with_mesh(self)
            .write_to(&mut file)?;
        file.flush()?;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.elements.clear();
        self.physical.clear();
        self.element_data.clear();
    }

    pub fn add_node(&mut self, id: u32, coords: Point) {
        self.nodes.insert(id, coords);
    }

    pub fn add_element(&mut self, id: u32, element: Element) {
        self.elements.insert(id, element);
    }

    pub fn add_physical(&mut self, name: impl Into<String>, id: i32, dimension: u8) {
        self.physical
            .insert(name.into(), PhysicalRegion { id, dimension });
    }

    /// Looks up a region by name, optionally checking its dimension.
    pub fn region(
        &self,
        name: &str,
        check_dim: Option<u8>,
    ) -> Result<PhysicalRegion, MeshError> {
        let region = *self
            .physical
            .get(name)
            .ok_or_else(|| MeshError::UnknownRegion(name.to_owned()))?;
        if let Some(expected) = check_dim {
            if region.dimension != expected {
                return Err(MeshError::DimensionMismatch {
                    name: name.to_owned(),
                    expected,
                    found: region.dimension,
                });
            }
        }
        Ok(region)
    }

    /// Region ids for the given names, in the same order.
    pub fn region_ids_by_names<S: AsRef<str>>(
        &self,
        names: &[S],
        check_dim: Option<u8>,
    ) -> Result<Vec<i32>, MeshError> {
        names
            .iter()
            .map(|name| self.region(name.as_ref(), check_dim).map(|r| r.id))
            .collect()
    }

    /// Ids of the elements whose first tag is one of `region_ids`.
    ///
    /// Assumes every element belongs to exactly one region. The order of
    /// the result is unspecified.
    pub fn elements_of_regions(&self, region_ids: &HashSet<i32>) -> Vec<u32> {
        if region_ids.is_empty() {
            return vec![];
        }
        self.elements
            .iter()
            .filter(|(_, e)| e.region_id().is_some_and(|r| region_ids.contains(&r)))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldData> {
        self.element_data.get(name)
    }

    pub fn field_block(&self, name: &str, time_index: i32) -> Option<&FieldBlock> {
        self.field(name).and_then(|f| f.get(time_index))
    }

    /// Stores a field block; each time index may be used once per field.
    pub fn insert_field_block(
        &mut self,
        field: &str,
        time_index: i32,
        block: FieldBlock,
    ) -> Result<(), MeshError> {
        self.element_data
            .entry(field.to_owned())
            .or_default()
            .try_insert(time_index, block)
            .map_err(|_| MeshError::DuplicateTimeIndex {
                field: field.to_owned(),
                time_index,
            })
    }

    pub(crate) fn sorted_node_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub(crate) fn sorted_element_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.elements.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
