pub mod element;
pub mod field;
pub mod header;

pub mod read;
pub mod write;

pub mod io;

pub mod mesh;

/// Version written into every `$MeshFormat` section.
pub const FORMAT_VERSION: &str = "2.2";
/// Byte size of a floating point value; the only size supported.
pub const DATA_SIZE: u32 = 8;

pub type HashMap<K, V> = rapidhash::RapidHashMap<K, V>;
pub type HashSet<T> = rapidhash::RapidHashSet<T>;

pub use field::{FieldBlock, FieldData};
pub use header::{FileType, MeshFormat};
pub use mesh::{Element, Mesh, MeshError, PhysicalRegion, Point};
pub use read::{MshReader, MshReaderSettings, ReadError, RowPolicy};
pub use write::{
    MshWriter, MshWriterSettings, WriteError, write_element_data, write_fields, write_fields_file,
};
