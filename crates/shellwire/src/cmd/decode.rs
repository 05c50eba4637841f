use crate::cmd::DecodeArgs;
use crate::exit::{codec_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_values, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let buffer = match (&args.hex, &args.file) {
        (Some(hex), _) => parse_hex(hex)?,
        (None, Some(path)) => std::fs::read(path).map_err(|err| io_error("read failed", err))?,
        (None, None) => return Err(CliError::new(USAGE, "give a hex buffer or --file")),
    };
    let values =
        shellwire_value::decode(&buffer).map_err(|err| codec_error("decode failed", err))?;
    print_values(&values, format);
    Ok(SUCCESS)
}

fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let digits: Vec<u8> = text
        .strip_prefix("0x")
        .unwrap_or(text)
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return Err(CliError::new(DATA_INVALID, "hex input has an odd number of digits"));
    }
    digits
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| {
                    CliError::new(
                        DATA_INVALID,
                        format!("invalid hex digits {:?}", String::from_utf8_lossy(pair)),
                    )
                })
        })
        .collect()
}
