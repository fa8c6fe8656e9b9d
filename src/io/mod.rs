// src/io/mod.rs
pub mod cif;
pub mod poscar;

use crate::error::{RenderError, Result};
use crate::model::Structure;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// Reads a structure file, dispatching on the file name. A trailing `.gz`
/// is decompressed first and the remaining name picks the format.
pub fn load_structure(path: impl AsRef<Path>) -> Result<Structure> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(RenderError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let p = path.to_string_lossy().to_lowercase();
    let structure = match p.strip_suffix(".gz") {
        Some(inner) => {
            let mut text = String::new();
            GzDecoder::new(BufReader::new(File::open(path)?))
                .read_to_string(&mut text)
                .map_err(|e| RenderError::parse(path, format!("gzip: {}", e)))?;
            parse_text(inner, &text, path)?
        }
        None => parse_text(&p, &fs::read_to_string(path)?, path)?,
    };

    log::info!(
        "Loaded {} ({} sites) from {}",
        structure.formula(),
        structure.len(),
        path.display()
    );
    Ok(structure)
}

fn parse_text(name: &str, text: &str, path: &Path) -> Result<Structure> {
    if name.ends_with(".cif") {
        cif::parse_str(text, path)
    } else if name.ends_with(".json") {
        Ok(serde_json::from_str(text)?)
    } else {
        // Fallback to POSCAR for .vasp, POSCAR/CONTCAR and unknown names
        poscar::parse_str(text, path)
    }
}

/// Writes a structure in the format picked by the file name; `.gz` output
/// is compressed.
pub fn save_structure(path: impl AsRef<Path>, structure: &Structure) -> Result<()> {
    let path = path.as_ref();
    let p = path.to_string_lossy().to_lowercase();
    let (name, compressed) = match p.strip_suffix(".gz") {
        Some(inner) => (inner, true),
        None => (p.as_str(), false),
    };

    let text = if name.ends_with(".cif") {
        cif::to_string(structure)
    } else if name.ends_with(".json") {
        serde_json::to_string_pretty(structure)?
    } else {
        poscar::to_string(structure)
    };

    if compressed {
        let mut encoder = GzEncoder::new(File::create(path)?, Compression::default());
        encoder.write_all(text.as_bytes())?;
        encoder.finish()?;
    } else {
        fs::write(path, text)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Lattice;

    #[test]
    fn test_missing_file_is_not_found() {
        let err = load_structure("/definitely/not/here.cif").unwrap_err();
        assert!(matches!(err, RenderError::NotFound { .. }));
    }

    #[test]
    fn test_save_and_load_each_format() {
        let dir = tempfile::tempdir().unwrap();
        let s = Structure::new(
            Lattice::cubic(3.5).unwrap(),
            &["Si", "Si"],
            &[[0.0, 0.0, 0.0], [0.25, 0.25, 0.25]],
            false,
        );
        for name in ["Si.cif", "Si.json", "POSCAR", "Si.vasp"] {
            let path = dir.path().join(name);
            save_structure(&path, &s).unwrap();
            let back = load_structure(&path).unwrap();
            assert_eq!(back.len(), 2, "{}", name);
            assert!((back.lattice.volume() - s.lattice.volume()).abs() < 1e-4, "{}", name);
        }
    }

    #[test]
    fn test_gzipped_cif_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let s = Structure::new(
            Lattice::from_parameters(3.2, 3.2, 5.2, 90.0, 90.0, 120.0).unwrap(),
            &["Zn", "O"],
            &[[1.0 / 3.0, 2.0 / 3.0, 0.0], [1.0 / 3.0, 2.0 / 3.0, 0.38]],
            false,
        );
        let path = dir.path().join("ZnO.cif.gz");
        save_structure(&path, &s).unwrap();
        // really compressed
        assert_eq!(&fs::read(&path).unwrap()[..2], b"\x1f\x8b");

        let back = load_structure(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.composition(), vec!["Zn".to_string(), "O".to_string()]);
        assert!((back.lattice.volume() - s.lattice.volume()).abs() < 1e-3);
    }

    #[test]
    fn test_gzip_of_plain_text_cif() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Po.cif.gz");
        let text = "data_Po\n_cell_length_a 3.35\n_cell_length_b 3.35\n_cell_length_c 3.35\n\
                    _cell_angle_alpha 90\n_cell_angle_beta 90\n_cell_angle_gamma 90\n\
                    loop_\n_atom_site_label\n_atom_site_fract_x\n_atom_site_fract_y\n_atom_site_fract_z\n\
                    Po1 0.0 0.0 0.0\n";
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::fast());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let s = load_structure(&path).unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s.sites()[0].species, "Po");
    }

    #[test]
    fn test_corrupt_gzip_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.cif.gz");
        fs::write(&path, b"\x1f\x8b not really gzip").unwrap();
        let err = load_structure(&path).unwrap_err();
        assert!(matches!(err, RenderError::Parse { .. }));
    }
}
