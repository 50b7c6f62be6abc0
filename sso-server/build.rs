fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/auth/auth.proto");

    // Parse with protox so builds do not depend on a system protoc.
    let descriptors = protox::compile(["auth/auth.proto"], ["proto"])?;

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_fds(descriptors)?;

    Ok(())
}
