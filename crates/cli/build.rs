use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("rolemark")
        .version("1.0.0")
        .author("Rolemark Contributors")
        .about("Label HTML elements with mobile layout roles")
        .arg(clap::arg!(<INPUT> "Local HTML file, or '-' for stdin"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-c --config <FILE> "JSON configuration file")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--debug_comments "Follow each analyzed element with a debug comment"))
        .arg(clap::arg!(--nav_classes <LIST> "Class overrides, e.g. 'topmenu,-ads'").value_name("LIST"))
        .arg(clap::arg!(--client_side_nav "Ignore class overrides"))
        .arg(clap::arg!(--id_prefix <PREFIX> "Prefix for synthesized identifiers").value_name("PREFIX"))
        .arg(clap::arg!(--disable "Pass the document through unchanged"))
        .arg(
            clap::arg!(--chunk_size <BYTES> "Stream the input in chunks, flushing after each")
                .value_name("BYTES")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            clap::arg!(--report <FILE> "Write a JSON labeling report ('-' for stderr)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "rolemark", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "rolemark", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "rolemark", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "rolemark", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
