//! Build script for ocrfind
//!
//! On Windows the application manifest is embedded so that paths longer
//! than 260 characters work. Archive shares are reached through UNC paths
//! (`\\server\share\2025\06-2025\06_10\...`) that routinely exceed that
//! limit once a matched folder is walked.
//!
//! The manifest (`ocrfind.manifest`) sets `longPathAware=true`, which
//! combined with the Windows 10 v1607+ registry setting raises the limit
//! to 32,767 characters. Other platforms need nothing here.

fn main() {
    #[cfg(windows)]
    {
        embed_resource::compile("ocrfind.rc", embed_resource::NONE);

        println!("cargo:rerun-if-changed=ocrfind.rc");
        println!("cargo:rerun-if-changed=ocrfind.manifest");
    }
}
