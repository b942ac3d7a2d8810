use crate::Failure;
use ggml_dequant::tensor_to_f32;
use gguf_file::GGufFile;
use std::path::PathBuf;

#[derive(Args)]
pub struct InspectTensorArgs {
    /// The file holding the tensor
    file: PathBuf,
    /// Name of the tensor to dequantize
    name: String,
    /// How many weights to print (all when omitted)
    count: Option<usize>,
}

impl InspectTensorArgs {
    pub fn inspect(self) -> Result<(), Failure> {
        let file = GGufFile::open(&self.file)
            .map_err(|e| format!("{}: {e}", self.file.display()))?;
        let gguf = file.view()?;
        let tensor = gguf
            .tensors
            .get(self.name.as_str())
            .ok_or_else(|| format!("tensor {} not found", self.name))?;

        let weights = tensor_to_f32(tensor)?;
        let count = self.count.unwrap_or(weights.len()).min(weights.len());
        for (i, w) in weights[..count].iter().enumerate() {
            print!("{w}, ");
            if i % 4 == 3 {
                println!();
            }
        }
        if count % 4 != 0 {
            println!();
        }
        Ok(())
    }
}
