mod common;

use common::*;
use msh_io::*;

fn sorted(mut ids: Vec<u32>) -> Vec<u32> {
    ids.sort_unstable();
    ids
}

#[test]
fn region_lookup_by_name() -> anyhow::Result<()> {
    let mesh = sample_mesh();
    assert_eq!(mesh.region("domain", None)?, PhysicalRegion { id: 20, dimension: 2 });
    assert_eq!(mesh.region("domain", Some(2))?.id, 20);
    assert!(matches!(
        mesh.region("outlet", None),
        Err(MeshError::UnknownRegion(name)) if name == "outlet"
    ));
    assert!(matches!(
        mesh.region("domain", Some(3)),
        Err(MeshError::DimensionMismatch { expected: 3, found: 2, .. })
    ));
    Ok(())
}

#[test]
fn region_ids_keep_name_order() -> anyhow::Result<()> {
    let mesh = sample_mesh();
    assert_eq!(mesh.region_ids_by_names(&["probe", "inlet"], None)?, vec![30, 10]);
    assert!(mesh.region_ids_by_names(&["probe", "inlet"], Some(0)).is_err());
    Ok(())
}

#[test]
fn elements_filtered_by_first_tag() {
    let mut mesh = sample_mesh();
    mesh.add_element(9, Element::new(15, vec![], vec![1]));

    let domain: HashSet<i32> = [20].into_iter().collect();
    assert_eq!(sorted(mesh.elements_of_regions(&domain)), vec![2, 3]);

    let boundary: HashSet<i32> = [10, 30].into_iter().collect();
    assert_eq!(sorted(mesh.elements_of_regions(&boundary)), vec![1, 7]);

    // second tag is not a region id
    let entity: HashSet<i32> = [2].into_iter().collect();
    assert!(mesh.elements_of_regions(&entity).is_empty());

    assert!(mesh.elements_of_regions(&HashSet::default()).is_empty());
}
