use crate::error::SimError;
use std::path::{Path, PathBuf};

/// One parsed program line: four fields of `width` bits each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u8,
    pub c: u8,
    pub a: u8,
    pub b: u8,
}

/// Parses program text: one `opcode C A B` instruction per line, each
/// token exactly `width` binary digits. Blank lines and `#`/`;` comments
/// are skipped. Any malformed line aborts the parse.
pub fn parse_source(source: &str, width: usize) -> Result<Vec<Instruction>, SimError> {
    let mut instructions = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line_number = index + 1;
        let line = match raw.find(|c| c == '#' || c == ';') {
            Some(comment) => &raw[..comment],
            None => raw,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 4 {
            return Err(SimError::MalformedLine {
                line: line_number,
                got: raw.trim().to_string(),
            });
        }

        let mut fields = [0u8; 4];
        for (field, token) in fields.iter_mut().zip(tokens.iter()) {
            *field = parse_field(token, width, line_number)?;
        }
        instructions.push(Instruction {
            opcode: fields[0],
            c: fields[1],
            a: fields[2],
            b: fields[3],
        });
    }

    Ok(instructions)
}

/// Parses one binary token of exactly `width` digits, MSB first. Tokens
/// with other characters or widths are rejected rather than silently
/// decimal-parsed.
fn parse_field(token: &str, width: usize, line: usize) -> Result<u8, SimError> {
    if token.len() != width || !token.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(SimError::BadField {
            line,
            field: token.to_string(),
            width,
        });
    }
    Ok(token
        .bytes()
        .fold(0u8, |acc, b| (acc << 1) | u8::from(b == b'1')))
}

/// Resolves a program path, trying `p`, `./p`, `../p` and `../src/p` in
/// that order.
pub fn resolve_path(path: &Path) -> Option<PathBuf> {
    if path.exists() {
        return Some(path.to_path_buf());
    }
    for prefix in ["./", "../", "../src/"] {
        let candidate = Path::new(prefix).join(path);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

impl Instruction {
    /// Packs the four fields into one LSB-first word of 4 x `width` bits,
    /// the layout of the program-memory data pins.
    pub fn pack(&self, width: usize) -> u64 {
        u64::from(self.opcode)
            | u64::from(self.c) << width
            | u64::from(self.a) << (2 * width)
            | u64::from(self.b) << (3 * width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_program() {
        let source = "\
# store 3 and 2, add them
001 101 011 000
001 110 010 000   ; trailing comment
010 111 101 110

000 000 000 000
";
        let program = parse_source(source, 3).unwrap();
        assert_eq!(program.len(), 4);
        assert_eq!(
            program[0],
            Instruction {
                opcode: 1,
                c: 5,
                a: 3,
                b: 0
            }
        );
        assert_eq!(
            program[2],
            Instruction {
                opcode: 2,
                c: 7,
                a: 5,
                b: 6
            }
        );
        assert_eq!(
            program[3],
            Instruction {
                opcode: 0,
                c: 0,
                a: 0,
                b: 0
            }
        );
    }

    #[test]
    fn test_narrow_field_rejected() {
        // Opcode one digit short: the whole load fails.
        let err = parse_source("00 000 000 000\n", 3).unwrap_err();
        assert!(matches!(err, SimError::BadField { line: 1, .. }));
    }

    #[test]
    fn test_non_binary_field_rejected() {
        let err = parse_source("001 101 0x1 000\n", 3).unwrap_err();
        assert!(matches!(err, SimError::BadField { .. }));

        // Decimal digits are not silently accepted either.
        let err = parse_source("001 101 021 000\n", 3).unwrap_err();
        assert!(matches!(err, SimError::BadField { .. }));
    }

    #[test]
    fn test_wrong_token_count_rejected() {
        let err = parse_source("001 101 011\n", 3).unwrap_err();
        assert!(matches!(err, SimError::MalformedLine { line: 1, .. }));

        let err = parse_source("001 101 011 000 111\n", 3).unwrap_err();
        assert!(matches!(err, SimError::MalformedLine { .. }));
    }

    #[test]
    fn test_error_reports_line_number() {
        let source = "001 101 011 000\n# fine so far\nbogus line\n";
        match parse_source(source, 3).unwrap_err() {
            SimError::MalformedLine { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_pack_layout() {
        let inst = Instruction {
            opcode: 0b001,
            c: 0b101,
            a: 0b011,
            b: 0b110,
        };
        assert_eq!(inst.pack(3), 0b110_011_101_001);
    }
}
