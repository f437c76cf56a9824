fn main() {
    // Generates $OUT_DIR/built.rs, used by the CLI to print version information
    built::write_built_file().expect("Failed to acquire build-time information");
}
