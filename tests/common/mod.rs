#![allow(dead_code)]

use std::io::Cursor;

use msh_io::*;

/// Two triangles, a boundary line and a probe point in three regions.
pub fn sample_mesh() -> Mesh {
    let mut mesh = Mesh::new();
    mesh.add_node(1, [0.0, 0.0, 0.0]);
    mesh.add_node(2, [1.0, 0.0, 0.0]);
    mesh.add_node(3, [0.0, 1.0, 0.0]);
    mesh.add_node(4, [0.1, 0.2, -3.5e-7]);
    mesh.add_element(1, Element::new(1, vec![10, 1], vec![1, 2]));
    mesh.add_element(2, Element::new(2, vec![20, 2], vec![1, 2, 3]));
    mesh.add_element(3, Element::new(2, vec![20, 2], vec![2, 4, 3]));
    mesh.add_element(7, Element::new(15, vec![30, 3], vec![4]));
    mesh.add_physical("inlet", 10, 1);
    mesh.add_physical("domain", 20, 2);
    mesh.add_physical("probe", 30, 0);
    mesh
}

pub fn write_mesh(mesh: &Mesh, file_type: FileType) -> Vec<u8> {
    let mut buf = vec![];
    MshWriter::new_with_settings(MshWriterSettings { file_type })
        .with_mesh(mesh)
        .write_to(&mut buf)
        .unwrap();
    buf
}

pub fn read_bytes(data: &[u8]) -> Result<Mesh, ReadError> {
    MshReader::init(&mut Cursor::new(data)).read_mesh()
}

pub fn read_bytes_with(settings: MshReaderSettings, data: &[u8]) -> Result<Mesh, ReadError> {
    MshReader::init_with_settings(settings, &mut Cursor::new(data)).read_mesh()
}

/// Start of a binary file up to and including the format section.
pub fn binary_prelude() -> Vec<u8> {
    let mut data = b"$MeshFormat\n2.2 1 8\n".to_vec();
    data.extend_from_slice(&1i32.to_ne_bytes());
    data.extend_from_slice(b"\n$EndMeshFormat\n");
    data
}

pub fn push_ints(data: &mut Vec<u8>, ints: &[i32]) {
    for i in ints {
        data.extend_from_slice(&i.to_ne_bytes());
    }
}
