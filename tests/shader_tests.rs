use std::path::PathBuf;

use text_rpg::core::shader::assemble_container;
use text_rpg::core::{ShaderBytecode, ShaderStage};
use text_rpg::GpuError;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("text-rpg-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_load_precompiled_objects() {
    let dir = temp_dir("cso");
    let vertex = assemble_container(&[(*b"SHEX", b"vertex program")]);
    let pixel = assemble_container(&[(*b"SHEX", b"pixel program")]);
    std::fs::write(dir.join("quad_vs.cso"), &vertex).unwrap();
    std::fs::write(dir.join("quad_ps.cso"), &pixel).unwrap();

    let loaded = ShaderBytecode::load(&dir, ShaderStage::Vertex).unwrap();
    assert_eq!(loaded.as_bytes(), vertex.as_slice());
    let loaded = ShaderBytecode::load(&dir, ShaderStage::Pixel).unwrap();
    assert_eq!(loaded.as_bytes(), pixel.as_slice());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_object_is_invalid_shader() {
    let dir = temp_dir("missing");
    let err = ShaderBytecode::load(&dir, ShaderStage::Pixel).unwrap_err();
    assert!(matches!(err, GpuError::InvalidShader(_)));
    assert!(err.to_string().contains("quad_ps.cso"));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_truncated_object_is_rejected() {
    let dir = temp_dir("truncated");
    let mut vertex = assemble_container(&[(*b"SHEX", b"vertex program")]);
    vertex.truncate(vertex.len() - 3);
    std::fs::write(dir.join("quad_vs.cso"), &vertex).unwrap();

    let err = ShaderBytecode::load(&dir, ShaderStage::Vertex).unwrap_err();
    assert!(err.is_fatal());
    std::fs::remove_dir_all(&dir).unwrap();
}
