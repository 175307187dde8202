use xxhash_rust::xxh3::Xxh3;

use crate::appearance::profile::StateColor;
use crate::resolve::table::StateTable;

const XXH3_SEED: u64 = 0x5c4e_d11e_40a7_3b29;

/// 128-bit content hash of a [`StateTable`].
///
/// Equal tables always hash equal across runs and platforms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct StateFingerprint {
    pub hi: u64,
    pub lo: u64,
}

impl std::fmt::Display for StateFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

pub fn fingerprint_table(table: &StateTable) -> StateFingerprint {
    let mut h = StableHasher::new();
    let frames = table.frames();
    h.write_i64(frames.start.0);
    h.write_i64(frames.end.0);

    h.write_u32(table.tracks().len() as u32);
    for track in table.tracks() {
        h.write_u64(track.product.0);
        h.write_u32(track.keys.len() as u32);
        for k in &track.keys {
            h.write_i64(k.frame.0);
            h.write_bool(k.visible);
            match k.color {
                StateColor::Override { color } => {
                    h.write_u8(0);
                    for c in color.to_array() {
                        h.write_f32(c);
                    }
                }
                StateColor::Original { alpha } => {
                    h.write_u8(1);
                    h.write_f32(alpha);
                }
            }
            h.write_f32(k.progress);
        }
    }
    h.finish()
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_i64(&mut self, v: i64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    fn finish(self) -> StateFingerprint {
        let v = self.inner.digest128();
        StateFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}
