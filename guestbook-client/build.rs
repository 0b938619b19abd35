fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Rebuild when the proto file changes
    println!("cargo:rerun-if-changed=proto/guestbook.proto");

    tonic_prost_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(&["proto/guestbook.proto"], &["proto"])?;
    Ok(())
}
