use crate::Failure;
use gguf_file::{GGufFile, GGufMetaKV, GGufReadError, GGufValueEvent};
use std::path::PathBuf;

#[derive(Args)]
pub struct ShowArgs {
    /// The file to show
    file: PathBuf,
    /// Print arrays in full instead of the first 30 elements
    #[clap(long)]
    verbose: bool,
}

impl ShowArgs {
    pub fn show(self) -> Result<(), Failure> {
        let file = GGufFile::open(&self.file)
            .map_err(|e| format!("{}: {e}", self.file.display()))?;
        let mut stream = file.stream()?;

        let header = stream.header();
        println!(
            "{} (ver {}): {} key-value pairs, {} tensors",
            self.file.display(),
            header.version,
            header.metadata_kv_count,
            header.tensor_count
        );

        let max_array_items = if self.verbose { 0 } else { 30 };
        while let Some(kv) = stream.next_meta_kv()? {
            print!("{}: [{}] ", kv.key(), kv.ty().name());
            print_value(&kv, max_array_items)?;
            println!();
        }

        let mut params = 0u64;
        while let Some(tensor) = stream.next_tensor()? {
            println!(
                "{} tensor {} @{}, {} weights, {} bytes",
                tensor.ggml_type(),
                tensor.name(),
                tensor.offset(),
                tensor.nelements(),
                tensor.nbytes()
            );
            params += tensor.nelements();
        }
        println!("total parameters: {:.2} B", params as f64 / 1e9);
        Ok(())
    }
}

/// Prints one metadata value, truncating arrays after `max_array_items`
/// elements; 0 disables truncation.
fn print_value(kv: &GGufMetaKV, max_array_items: u64) -> Result<(), GGufReadError> {
    kv.visit(|event, in_array, array_len| {
        if max_array_items != 0 && in_array > max_array_items {
            if in_array - 1 == max_array_items {
                print!("... {} more items of {}", array_len - in_array + 1, array_len);
            }
            return;
        }
        match event {
            GGufValueEvent::ArrayStart(_) => print!("["),
            GGufValueEvent::Scalar(value) => print!("{value}"),
            GGufValueEvent::ArrayEnd(_) => print!("]"),
        }
        if in_array != 0 && in_array != array_len {
            print!(", ");
        }
    })
}
