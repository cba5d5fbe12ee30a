//! Stable 128-bit digest of a compile output, for reproducibility checks.

use crate::{compile::CompileOutput, error::MenuclipResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutputFingerprint {
    pub hi: u64,
    pub lo: u64,
}

impl std::fmt::Display for OutputFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

/// Hashes the serialized form, so anything a downstream consumer can observe
/// takes part. Object keys are visited sorted.
pub fn fingerprint_output(output: &CompileOutput) -> MenuclipResult<OutputFingerprint> {
    let value = serde_json::to_value(output)?;
    let mut digest = OutputDigest::new();
    digest.value(&value);
    Ok(digest.finish())
}

/// Two FNV-1a lanes with distinct offsets, fed the same bytes.
struct OutputDigest {
    lanes: [u64; 2],
}

impl OutputDigest {
    const PRIME: u64 = 0x100000001b3;

    fn new() -> Self {
        Self {
            lanes: [0xcbf29ce484222325, 0x9ae16a3b2f90404f],
        }
    }

    fn bytes(&mut self, bytes: &[u8]) {
        for lane in &mut self.lanes {
            for &b in bytes {
                *lane = (*lane ^ u64::from(b)).wrapping_mul(Self::PRIME);
            }
        }
    }

    fn tag(&mut self, tag: u8) {
        self.bytes(&[tag]);
    }

    fn len(&mut self, len: usize) {
        self.bytes(&(len as u64).to_le_bytes());
    }

    fn text(&mut self, s: &str) {
        self.len(s.len());
        self.bytes(s.as_bytes());
    }

    fn value(&mut self, v: &serde_json::Value) {
        use serde_json::Value as Json;
        match v {
            Json::Null => self.tag(0),
            Json::Bool(x) => {
                self.tag(1);
                self.tag(u8::from(*x));
            }
            Json::Number(n) => {
                self.tag(2);
                self.text(&n.to_string());
            }
            Json::String(s) => {
                self.tag(3);
                self.text(s);
            }
            Json::Array(items) => {
                self.tag(4);
                self.len(items.len());
                items.iter().for_each(|item| self.value(item));
            }
            Json::Object(map) => {
                self.tag(5);
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                self.len(entries.len());
                for (k, v) in entries {
                    self.text(k);
                    self.value(v);
                }
            }
        }
    }

    fn finish(self) -> OutputFingerprint {
        let [hi, lo] = self.lanes;
        OutputFingerprint { hi, lo }
    }
}
