fn main() {
    #[cfg(feature = "cli")]
    gbalz::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("gbalz: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
