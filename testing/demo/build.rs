fn main() -> Result<(), Box<dyn std::error::Error>> {
    autodelegate_build::build!("src/lib.rs");

    Ok(())
}
