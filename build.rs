//! Build script to embed Windows resource metadata into the stub
//! The icon (resource id 1) is what the tray shows when present

fn main() {
    #[cfg(windows)]
    {
        let mut res = winresource::WindowsResource::new();

        res.set("ProductName", "SiteWrap");
        res.set("FileDescription", "SiteWrap web app");
        res.set("InternalName", "SiteWrapStub");
        res.set("OriginalFilename", "sitewrap_stub.exe");
        res.set("ProductVersion", env!("CARGO_PKG_VERSION"));
        res.set("FileVersion", env!("CARGO_PKG_VERSION"));

        let icon = std::path::Path::new("assets/app.ico");
        println!("cargo:rerun-if-changed=assets/app.ico");
        if icon.exists() {
            res.set_icon_with_id("assets/app.ico", "1");
        }

        if let Err(e) = res.compile() {
            eprintln!("Warning: Failed to compile Windows resources: {}", e);
        }
    }
}
