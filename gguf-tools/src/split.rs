use crate::Failure;
use gguf_file::{pad, GGmlType, GGufFile};
use log::{debug, info};
use regex::Regex;
use std::{path::PathBuf, sync::OnceLock};

const EXPERT_KEYS: [&str; 2] = ["llama.expert_count", "llama.expert_used_count"];
const BLOCK_COUNT: usize = 32;

#[derive(Args)]
pub struct SplitMixtralArgs {
    /// One expert id (0-7) per transformer block; missing digits repeat
    /// the last one given
    experts: String,
    /// The Mixtral file to read
    input: PathBuf,
    /// Where to write the single-expert model
    output: PathBuf,
}

/// Feed-forward expert tensors are named `blk.<block>.ffn_<which>.<expert>.weight`.
fn expert_tensor_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^blk\.(\d+)\.ffn_(gate|down|up)\.(\d+)\.weight$").unwrap()
    })
}

fn parse_experts(digits: &str) -> Result<Vec<u32>, Failure> {
    let mut experts = vec![];
    for c in digits.chars() {
        match c.to_digit(8) {
            Some(d) => experts.push(d),
            None => return Err(format!("invalid expert id {c:?}, expected a digit 0-7").into()),
        }
    }
    match experts.len() {
        0 => Err("no expert ids given".into()),
        n if n > BLOCK_COUNT => Err(format!("at most {BLOCK_COUNT} expert ids expected").into()),
        _ => {
            let last = *experts.last().unwrap();
            experts.resize(BLOCK_COUNT, last);
            Ok(experts)
        }
    }
}

impl SplitMixtralArgs {
    pub fn split(self) -> Result<(), Failure> {
        let experts = parse_experts(&self.experts)?;

        let input = GGufFile::open(&self.input)
            .map_err(|e| format!("{}: {e}", self.input.display()))?;
        let gguf = input.view()?;

        let mut out = GGufFile::create(&self.output, true)
            .map_err(|e| format!("{}: {e}", self.output.display()))?;

        // All non-expert metadata survives; the result is a plain
        // single-expert model.
        for (key, kv) in &gguf.meta_kvs {
            if EXPERT_KEYS.contains(key) {
                continue;
            }
            out.append_meta_kv(key, kv.ty(), kv.value_bytes())?;
        }

        // Select the surviving tensors, renaming expert tensors by
        // stripping the `.<expert>` infix.
        struct Kept<'a> {
            name: String,
            shape: Vec<u64>,
            ty: GGmlType,
            data: &'a [u8],
        }
        let mut kept = vec![];
        for (name, tensor) in &gguf.tensors {
            let name = match expert_tensor_regex().captures(name) {
                Some(caps) => {
                    let block = caps[1].parse::<usize>()?;
                    let expert = caps[3].parse::<u32>()?;
                    if block >= BLOCK_COUNT || experts[block] != expert {
                        debug!("dropping {name}");
                        continue;
                    }
                    format!("blk.{block}.ffn_{}.weight", &caps[2])
                }
                None => name.to_string(),
            };
            kept.push(Kept {
                name,
                shape: tensor.shape().to_vec(),
                ty: tensor.ggml_type(),
                data: tensor.data(),
            });
        }

        // Build protocol: descriptors carry monotonic aligned offsets,
        // then the payloads follow in the same order.
        let alignment = out.alignment();
        let mut offset = 0u64;
        for t in &kept {
            out.append_tensor_info(&t.name, &t.shape, t.ty, offset)?;
            offset += t.data.len() as u64;
            offset += pad(offset as usize, alignment) as u64;
        }
        for t in &kept {
            out.append_tensor_data(t.data)?;
        }

        info!(
            "kept {} of {} tensors in {}",
            kept.len(),
            gguf.tensors.len(),
            self.output.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expert_names_are_recognized_and_stripped() {
        let caps = expert_tensor_regex()
            .captures("blk.17.ffn_gate.5.weight")
            .unwrap();
        assert_eq!(&caps[1], "17");
        assert_eq!(&caps[2], "gate");
        assert_eq!(&caps[3], "5");

        assert!(expert_tensor_regex()
            .captures("blk.17.ffn_norm.weight")
            .is_none());
        assert!(expert_tensor_regex()
            .captures("blk.17.attn_q.weight")
            .is_none());
    }

    #[test]
    fn missing_expert_digits_repeat_the_last() {
        let experts = parse_experts("012").unwrap();
        assert_eq!(experts.len(), BLOCK_COUNT);
        assert_eq!(&experts[..3], [0, 1, 2]);
        assert!(experts[3..].iter().all(|&e| e == 2));

        assert!(parse_experts("8").is_err());
        assert!(parse_experts("").is_err());
    }
}
