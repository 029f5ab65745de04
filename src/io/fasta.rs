use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ProteinRecord {
    pub id: String,
    pub desc: Option<String>,
    pub seq: Vec<u8>,
}

impl ProteinRecord {
    /// Accession used to report hits: the middle field of UniProt style
    /// `db|ACCESSION|ENTRY` identifiers, otherwise the whole identifier.
    pub fn accession(&self) -> &str {
        let mut fields = self.id.split('|');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(db), Some(acc), Some(_)) if !db.is_empty() && !acc.is_empty() => acc,
            _ => &self.id,
        }
    }
}

pub struct FastaReader<R: BufRead> {
    reader: R,
    buf: String,
    done: bool,
    peek_header: Option<String>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            done: false,
            peek_header: None,
        }
    }

    pub fn next_record(&mut self) -> Result<Option<ProteinRecord>> {
        if self.done {
            return Ok(None);
        }

        // Find header line; ';' comment lines before it are skipped
        let header = if let Some(h) = self.peek_header.take() {
            h
        } else {
            loop {
                self.buf.clear();
                let n = self.reader.read_line(&mut self.buf)?;
                if n == 0 {
                    self.done = true;
                    return Ok(None);
                }
                if let Some(rest) = self.buf.strip_prefix('>') {
                    break rest.trim().to_string();
                }
            }
        };

        let mut parts = header.splitn(2, char::is_whitespace);
        let id = parts.next().unwrap_or("").to_string();
        let desc = parts
            .next()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        // Residues may wrap over any number of lines; '*' stop markers are dropped
        let mut seq: Vec<u8> = Vec::new();
        loop {
            self.buf.clear();
            let n = self.reader.read_line(&mut self.buf)?;
            if n == 0 {
                self.done = true;
                break;
            }
            if let Some(rest) = self.buf.strip_prefix('>') {
                self.peek_header = Some(rest.trim().to_string());
                break;
            }
            if self.buf.starts_with(';') {
                continue;
            }
            for &b in self.buf.as_bytes() {
                match b {
                    b'\n' | b'\r' | b' ' | b'\t' | b'*' => {}
                    _ => seq.push(b.to_ascii_uppercase()),
                }
            }
        }

        Ok(Some(ProteinRecord { id, desc, seq }))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<ProteinRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Reads a whole protein FASTA file into (accession, sequence) pairs, in file order.
pub fn read_proteins(path: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let fh = std::fs::File::open(path).with_context(|| format!("cannot open protein FASTA '{}'", path.display()))?;
    let reader = FastaReader::new(std::io::BufReader::new(fh));
    let mut proteins = Vec::new();
    for record in reader {
        let record = record.with_context(|| format!("cannot read protein FASTA '{}'", path.display()))?;
        proteins.push((record.accession().to_string(), record.seq));
    }
    Ok(proteins)
}
