use crate::Failure;
use ggml_dequant::tensor_to_f32;
use gguf_file::GGufFile;
use log::warn;
use std::path::PathBuf;

#[derive(Args)]
pub struct CompareArgs {
    /// The reference file
    file_a: PathBuf,
    /// The file to compare against it
    file_b: PathBuf,
}

impl CompareArgs {
    pub fn compare(self) -> Result<(), Failure> {
        let a = GGufFile::open(&self.file_a)
            .map_err(|e| format!("{}: {e}", self.file_a.display()))?;
        let b = GGufFile::open(&self.file_b)
            .map_err(|e| format!("{}: {e}", self.file_b.display()))?;
        let a = a.view()?;
        let b = b.view()?;

        for (name, ta) in &a.tensors {
            let Some(tb) = b.tensors.get(name) else {
                continue;
            };
            if ta.nelements() != tb.nelements() {
                warn!(
                    "skipping {name}: {} weights vs {}",
                    ta.nelements(),
                    tb.nelements()
                );
                continue;
            }
            let wa = tensor_to_f32(ta)?;
            let wb = tensor_to_f32(tb)?;
            println!(
                "{name}: avg weights difference: {:.4}%",
                avg_difference(&wa, &wb)
            );
        }
        Ok(())
    }
}

/// Mean absolute difference over mean magnitude, as a percentage.
fn avg_difference(a: &[f32], b: &[f32]) -> f64 {
    let mut diff = 0f64;
    let mut magnitude = 0f64;
    for (&x, &y) in a.iter().zip(b) {
        diff += (x as f64 - y as f64).abs();
        magnitude += (x.abs() as f64 + y.abs() as f64) / 2.;
    }
    if magnitude == 0. {
        return 0.;
    }
    diff / magnitude * 100.
}
