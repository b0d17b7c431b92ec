use crate::utils::Result;
use nalgebra::Vector3;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

static THREE_TO_ONE: Lazy<HashMap<&'static str, u8>> = Lazy::new(|| {
    HashMap::from([
        ("ALA", b'A'),
        ("ARG", b'R'),
        ("ASN", b'N'),
        ("ASP", b'D'),
        ("CYS", b'C'),
        ("GLN", b'Q'),
        ("GLU", b'E'),
        ("GLY", b'G'),
        ("HIS", b'H'),
        ("ILE", b'I'),
        ("LEU", b'L'),
        ("LYS", b'K'),
        ("MET", b'M'),
        ("PHE", b'F'),
        ("PRO", b'P'),
        ("SER", b'S'),
        ("THR", b'T'),
        ("TRP", b'W'),
        ("TYR", b'Y'),
        ("VAL", b'V'),
    ])
});

#[derive(Debug, Clone)]
pub struct CaResidue {
    pub resname: String,
    pub one_letter: u8,
    pub chain: char,
    pub resseq: i32,
    pub coord: Vector3<f64>,
}

/// A structure reduced to its CA trace, in file order.
#[derive(Debug, Clone)]
pub struct Structure {
    pub name: String,
    pub residues: Vec<CaResidue>,
}

impl Structure {
    pub fn from_pdb(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "structure".to_string());
        let mut residues = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line =
                line.map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            if let Some(residue) = parse_ca_line(&line)
                .map_err(|e| format!("{} line {}: {}", path.display(), index + 1, e))?
            {
                residues.push(residue);
            }
        }
        if residues.is_empty() {
            return Err(format!("No CA atoms found in {}", path.display()));
        }
        Ok(Structure { name, residues })
    }

    /// One-letter residue sequence of the CA trace.
    pub fn sequence(&self) -> Vec<u8> {
        self.residues.iter().map(|res| res.one_letter).collect()
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

/// Returns Ok(None) for lines that are not primary CA atom records.
fn parse_ca_line(line: &str) -> std::result::Result<Option<CaResidue>, String> {
    let bytes = line.as_bytes();
    if !line.starts_with("ATOM") || bytes.len() < 54 {
        return Ok(None);
    }
    let atom_name = field(bytes, 12, 16)?;
    let altloc = bytes[16];
    if atom_name != "CA" || !matches!(altloc, b' ' | b'A') {
        return Ok(None);
    }
    let resname = field(bytes, 17, 20)?.to_string();
    let chain = bytes[21] as char;
    let resseq_text = field(bytes, 22, 26)?;
    let resseq: i32 = resseq_text
        .parse()
        .map_err(|_| format!("Bad residue number '{}'", resseq_text))?;
    let mut coords = [0.0f64; 3];
    for (axis, coord) in coords.iter_mut().enumerate() {
        let text = field(bytes, 30 + 8 * axis, 38 + 8 * axis)?;
        *coord = text
            .parse()
            .map_err(|_| format!("Bad coordinate '{}'", text))?;
    }
    let one_letter = *THREE_TO_ONE.get(resname.as_str()).unwrap_or(&b'X');
    Ok(Some(CaResidue {
        resname,
        one_letter,
        chain,
        resseq,
        coord: Vector3::new(coords[0], coords[1], coords[2]),
    }))
}

/// Fixed-column field, trimmed. Slicing bytes rather than the str keeps
/// stray multi-byte characters from panicking mid-character.
fn field(bytes: &[u8], start: usize, end: usize) -> std::result::Result<&str, String> {
    std::str::from_utf8(&bytes[start..end])
        .map(str::trim)
        .map_err(|_| format!("Non-ASCII text in columns {}-{}", start + 1, end))
}

/// Writes the CA trace back out as minimal ATOM records.
pub fn write_ca_pdb(path: &Path, structure: &Structure) -> Result<()> {
    let file = std::fs::File::create(path)
        .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
    let mut writer = std::io::BufWriter::new(file);
    for (index, res) in structure.residues.iter().enumerate() {
        writeln!(
            writer,
            "ATOM  {:>5}  CA  {:>3} {}{:>4}    {:8.3}{:8.3}{:8.3}  1.00  0.00           C",
            index + 1,
            res.resname,
            res.chain,
            res.resseq,
            res.coord.x,
            res.coord.y,
            res.coord.z
        )
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    }
    writeln!(writer, "END").map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    pub fn pdb_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const THREE_RESIDUES: &str = "\
ATOM      1  N   MET A   1      11.104   6.134  -6.504  1.00  0.00           N
ATOM      2  CA  MET A   1      11.639   6.071  -5.147  1.00  0.00           C
ATOM      3  CA  LYS A   2      12.722   9.111  -4.660  1.00  0.00           C
ATOM      4  CB  LYS A   2      13.000   9.500  -3.000  1.00  0.00           C
ATOM      5  CA  VAL A   3      15.111   9.049  -7.102  1.00  0.00           C
TER
END
";

    #[test]
    fn parses_only_primary_ca_atoms() {
        let file = pdb_file(THREE_RESIDUES);
        let structure = Structure::from_pdb(file.path()).unwrap();
        assert_eq!(structure.len(), 3);
        assert_eq!(structure.sequence(), b"MKV");
        assert_eq!(structure.residues[0].chain, 'A');
        assert_eq!(structure.residues[2].resseq, 3);
        assert_eq!(structure.residues[1].coord.y, 9.111);
    }

    #[test]
    fn malformed_coordinate_reports_the_line() {
        let bad = THREE_RESIDUES.replace("15.111", "xx.xxx");
        let file = pdb_file(&bad);
        let err = Structure::from_pdb(file.path()).unwrap_err();
        assert!(err.contains("line 5"), "{}", err);
        assert!(err.contains("Bad coordinate"));
    }

    #[test]
    fn multibyte_text_in_an_atom_line_is_an_error() {
        // 15 ASCII bytes, then a two-byte character straddling column 16
        let stray = format!("{:<15}é{:<40}\n", "ATOM", "");
        let file = pdb_file(&format!("{}{}", stray, THREE_RESIDUES));
        let err = Structure::from_pdb(file.path()).unwrap_err();
        assert!(err.contains("line 1"), "{}", err);
        assert!(err.contains("columns"), "{}", err);
    }

    #[test]
    fn empty_trace_is_an_error() {
        let file = pdb_file("HEADER    TEST\nEND\n");
        assert!(Structure::from_pdb(file.path())
            .unwrap_err()
            .contains("No CA atoms"));
    }

    #[test]
    fn round_trips_through_the_writer() {
        let file = pdb_file(THREE_RESIDUES);
        let structure = Structure::from_pdb(file.path()).unwrap();
        let out = NamedTempFile::new().unwrap();
        write_ca_pdb(out.path(), &structure).unwrap();
        let reread = Structure::from_pdb(out.path()).unwrap();
        assert_eq!(reread.sequence(), structure.sequence());
        assert_eq!(reread.residues[1].coord, structure.residues[1].coord);
    }
}
