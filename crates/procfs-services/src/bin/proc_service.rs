//! Proc Service entry point
//!
//! ```text
//! proc_service <boot-image> [config.json]
//! ```
//!
//! Bootstraps the namespace from the image, serves it on an in-process
//! channel and runs a short client session against it: list `/` and the
//! boot directory, then print `/sys` and `/devices`.

use std::env;
use std::fs;
use std::process::ExitCode;
use std::thread;

use procfs_dispatch::local::{LocalChannel, LocalClient, LocalConnector, LocalShare};
use procfs_ipc::open::O_RDONLY;
use procfs_services::{FileImage, ProcService, ServerConfig, ServerRuntime};
use procfs_vfs::{EntryKind, ProcClient, VfsError};

fn load_config(path: Option<&String>) -> Result<ServerConfig, String> {
    let Some(path) = path else {
        return Ok(ServerConfig::default());
    };
    let bytes = fs::read(path).map_err(|e| format!("{}: {}", path, e))?;
    ServerConfig::from_json(&bytes).map_err(|e| format!("{}: {}", path, e))
}

fn list(client: &mut ProcClient<LocalClient>, path: &str) -> Result<(), VfsError> {
    println!("{}:", path);
    for entry in client.list(path)? {
        match entry.kind {
            EntryKind::Directory => println!("  d {:>8}  {}", "-", entry.name),
            EntryKind::File { size } => println!("  f {:>8}  {}", size, entry.name),
        }
    }
    Ok(())
}

fn cat(client: &mut ProcClient<LocalClient>, path: &str) -> Result<(), VfsError> {
    client.open(path, O_RDONLY)?;
    let data = client.read_to_end();
    client.close()?;
    print!("{}", String::from_utf8_lossy(&data?));
    Ok(())
}

fn demo(connector: &LocalConnector, config: &ServerConfig) -> Result<(), VfsError> {
    let transport = connector
        .connect()
        .map_err(|e| VfsError::protocol(e.to_string()))?;
    let mut client = ProcClient::new(transport).with_buffer_size(config.buffer_size as u32);

    list(&mut client, "/")?;
    list(&mut client, &config.boot_dir)?;
    cat(&mut client, &config.sys_path)?;
    cat(&mut client, &config.devices_path)?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let Some(image_path) = args.get(1) else {
        let program = args.first().map(String::as_str).unwrap_or("proc_service");
        eprintln!("usage: {} <boot-image> [config.json]", program);
        return ExitCode::FAILURE;
    };

    let config = match load_config(args.get(2)) {
        Ok(config) => config,
        Err(e) => {
            log::error!("proc_service: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut service = ProcService::new(config.clone(), LocalShare::new());
    if let Err(e) = service.bootstrap(&mut FileImage::new(image_path)) {
        log::error!("proc_service: bootstrap failed: {}", e);
        return ExitCode::FAILURE;
    }

    let (mut channel, connector) = LocalChannel::new();
    let ctx = config.context();
    let server = thread::spawn(move || ServerRuntime::new(ctx).run(&mut service, &mut channel));

    let demo_result = demo(&connector, &config);
    // Dropping the last connector closes the channel and ends the loop.
    drop(connector);

    let served = match server.join() {
        Ok(result) => result,
        Err(_) => {
            log::error!("proc_service: server thread panicked");
            return ExitCode::FAILURE;
        }
    };
    match (demo_result, served) {
        (Ok(()), Ok(stats)) => {
            log::info!("proc_service: done, {} requests served", stats.requests);
            ExitCode::SUCCESS
        }
        (Err(e), _) => {
            log::error!("proc_service: client session failed: {}", e);
            ExitCode::FAILURE
        }
        (_, Err(e)) => {
            log::error!("proc_service: server failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
