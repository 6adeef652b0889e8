//! Build-script entry point.
//!
//! Call from `build.rs` with the crate root source file:
//!
//! ```ignore
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     autodelegate_build::build!("src/lib.rs");
//!
//!     Ok(())
//! }
//! ```
#[macro_export]
macro_rules! build {
    ($source:expr) => {{
        use std::env::var;

        //
        // CARGO
        //

        println!("cargo:rerun-if-changed=build.rs");
        for key in $crate::CONFIG_ENV_KEYS {
            println!("cargo:rerun-if-env-changed={key}");
        }

        // Get the output directory set by Cargo
        let out_dir = var("OUT_DIR").expect("OUT_DIR not set");

        //
        // GENERATED CODE
        //

        let config = $crate::Config::from_env()?;
        let output = $crate::generate_to($source, &out_dir, &config)?;

        for file in &output.files {
            println!("cargo:rerun-if-changed={}", file.display());
        }
        for failure in &output.report.failures {
            println!("cargo:warning=auto_delegate: {failure}");
        }

        output.report.into_result()?;
    }};
}
