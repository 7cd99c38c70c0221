fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tell Cargo to rerun this if the proto file changes
    println!("cargo:rerun-if-changed=src/proto/plugin.proto");

    tonic_build::configure()
        .protoc_arg("--experimental_allow_proto3_optional") // Enable proto3 optional fields
        .build_server(true)
        .build_client(false)
        .compile(
            &["src/proto/plugin.proto"],
            &["src/proto"], // The directory containing the .proto files
        )?;

    Ok(())
}
