use criterion::{criterion_group, criterion_main, Criterion};
use lumen_core::lighting::LightingGuid;
use lumen_core::math::{Aabb, Vec3};
use lumen_core::scene::{ComponentId, MappingDesc, MeshDesc, PrimitiveLightingInfo};
use lumen_data::StaticLightingSet;
use std::hint::black_box;
use uuid::Uuid;

fn build_set(primitives: u64) -> StaticLightingSet {
    let mut set = StaticLightingSet::new();
    for i in 0..primitives {
        let size = 4 + (i * 37 % 29) as u32 * 4;
        let info = PrimitiveLightingInfo {
            meshes: vec![MeshDesc {
                guid: Uuid::new_v4(),
                element: 0,
                bounds: Aabb::from_min_max(Vec3::splat(i as f32), Vec3::splat(i as f32 + 1.0)),
                cast_shadow: i % 3 != 0,
                num_triangles: 128,
                num_vertices: 96,
            }],
            mappings: vec![MappingDesc {
                mesh: 0,
                size_x: size,
                size_y: size,
                description: String::new(),
            }],
        };
        let _ = set.add_primitive(ComponentId(i), info, &[], None, true);
    }
    set
}

fn bench_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("Static Lighting Set");

    group.bench_function("Merge 10k primitives", |b| {
        b.iter(|| black_box(build_set(10_000)));
    });

    let template = build_set(10_000);
    group.bench_function("Sort and index 10k mappings", |b| {
        b.iter(|| {
            let mut set = template.clone();
            set.sort_mappings_by_texel_count();
            for index in 0..set.len() {
                set.set_mapping_guid(index, LightingGuid::deterministic(index as u32));
            }
            black_box(set.len());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_set);
criterion_main!(benches);
