//! Build script to generate build-time information

use vergen::EmitBuilder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // VERGEN_BUILD_DATE is reported by the health endpoint
    EmitBuilder::builder().build_date().emit()?;

    Ok(())
}
