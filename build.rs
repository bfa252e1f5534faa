//! Build script for detecting system dependencies of the optional backends.
//!
//! Only the `opencv` feature needs system libraries; without it nothing is probed.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if env::var_os("CARGO_FEATURE_OPENCV").is_some() {
        check_pkg_config();
        check_opencv();
    }

    if env::var_os("CARGO_FEATURE_ONNX").is_some() {
        println!("cargo:rerun-if-env-changed=ORT_LIB_LOCATION");
        if env::var_os("ORT_LIB_LOCATION").is_none() {
            println!("cargo:warning=ORT_LIB_LOCATION not set; ort will download ONNX Runtime binaries");
        }
    }
}

fn check_opencv() {
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");

    for module in ["opencv4", "opencv"] {
        let output = Command::new("pkg-config").args(["--modversion", module]).output();
        if let Ok(output) = output {
            if output.status.success() {
                let version = String::from_utf8_lossy(&output.stdout);
                println!("cargo:warning=Found OpenCV version: {}", version.trim());
                return;
            }
        }
    }

    println!("cargo:warning=OpenCV not found via pkg-config. The `opencv` feature needs it (with the tracking contrib module).");
    println!("cargo:warning=On Debian/Raspberry Pi OS: sudo apt-get install libopencv-dev libopencv-contrib-dev clang libclang-dev");
    println!("cargo:warning=On macOS: brew install opencv");
}

fn check_pkg_config() {
    let output = Command::new("pkg-config").arg("--version").output();

    match output {
        Ok(output) if output.status.success() => {}
        _ => {
            println!("cargo:warning=pkg-config not found. This is required to find OpenCV.");
            println!("cargo:warning=On Debian/Raspberry Pi OS: sudo apt-get install pkg-config");
            println!("cargo:warning=On macOS: brew install pkg-config");
        }
    }
}
