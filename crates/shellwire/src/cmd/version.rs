use shellwire_frame::MessageKind;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("shellwire {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: shellwire");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("SHELLWIRE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    let kinds: Vec<String> = MessageKind::ALL
        .iter()
        .map(|kind| format!("{}=0x{:02x}", kind.name(), kind.wire_value()))
        .collect();
    println!("message_kinds: {}", kinds.join(", "));
    println!(
        "features: endpoint={}, async={}, json={}, cli=true",
        cfg!(feature = "endpoint"),
        cfg!(feature = "async"),
        cfg!(feature = "json")
    );

    Ok(SUCCESS)
}
