pub fn run() -> anyhow::Result<()> {
    println!("perflog {}", env!("CARGO_PKG_VERSION"));
    println!("Session-based performance logging for capture and OCR pipelines");
    Ok(())
}
