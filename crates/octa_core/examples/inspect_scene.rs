//! Example: Load and inspect a scene file.
//!
//! Run with: cargo run --example inspect_scene -- scenes/spheres.txt

use std::env;

use octa_core::load_scene;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: inspect_scene <path-to-scene-file>");
        println!("\nExample:");
        println!("  cargo run --example inspect_scene -- scenes/spheres.txt");
        return;
    }

    let path = &args[1];
    println!("Loading scene file: {}", path);

    match load_scene(path, 1.0) {
        Ok(scene) => {
            let camera = &scene.camera;
            println!("\n=== Camera ===");
            println!(
                "  from ({:.2}, {:.2}, {:.2}) at ({:.2}, {:.2}, {:.2})",
                camera.look_from.x,
                camera.look_from.y,
                camera.look_from.z,
                camera.look_at.x,
                camera.look_at.y,
                camera.look_at.z
            );
            println!(
                "  fov {:.1}, aperture {:.3}, focus {:.3}",
                camera.vfov, camera.aperture, camera.focus_dist
            );

            println!("\n--- Materials ---");
            for (i, material) in scene.materials.iter().enumerate() {
                println!(
                    "  [{}] {} albedo ({:.2}, {:.2}, {:.2}){}",
                    i,
                    material.kind.keyword(),
                    material.albedo.x,
                    material.albedo.y,
                    material.albedo.z,
                    if material.is_emissive() { " (light)" } else { "" }
                );
            }

            println!("\n--- Geometry ---");
            println!("Spheres: {}", scene.spheres.len());
            println!("Triangles: {}", scene.triangles.len());
            for model in &scene.models {
                println!(
                    "Model {} - {} vertices, {} triangles",
                    model.path.display(),
                    model.mesh.vertex_count(),
                    model.mesh.triangle_count()
                );
            }
            println!("Total triangles: {}", scene.total_triangle_count());
        }
        Err(e) => {
            eprintln!("Error loading scene: {}", e);
            std::process::exit(1);
        }
    }
}
