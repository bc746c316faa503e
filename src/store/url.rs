use std::fmt;

use clap::ValueEnum;
use percent_encoding::percent_decode_str;

use super::id::ExtensionId;

pub const UPDATE_SERVICE_URL: &str = "https://clients2.google.com/service/update2/crx";

/// A high product version keeps the update service from answering 204.
pub const DEFAULT_PROD_VERSION: &str = "9999.0.9999.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Os {
    Win,
    Mac,
    Linux,
    Cros,
    Openbsd,
    Android,
}

impl Os {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => Os::Mac,
            "windows" => Os::Win,
            "openbsd" => Os::Openbsd,
            "android" => Os::Android,
            _ => Os::Linux,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Win => "win",
            Os::Mac => "mac",
            Os::Linux => "linux",
            Os::Cros => "cros",
            Os::Openbsd => "openbsd",
            Os::Android => "android",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Arch {
    Arm,
    #[value(name = "x86-64")]
    X86_64,
    #[value(name = "x86-32")]
    X86_32,
}

impl Arch {
    pub fn current() -> Self {
        match std::env::consts::ARCH {
            "arm" | "aarch64" => Arch::Arm,
            "x86_64" => Arch::X86_64,
            _ => Arch::X86_32,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Arm => "arm",
            Arch::X86_64 => "x86-64",
            Arch::X86_32 => "x86-32",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Product {
    #[value(name = "chromecrx")]
    Chrome,
    #[value(name = "chromiumcrx")]
    Chromium,
}

impl Product {
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::Chrome => "chromecrx",
            Product::Chromium => "chromiumcrx",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Os, Arch, Product);

/// Parameters sent to the update service. These are opaque to the service
/// negotiation; the defaults describe the machine the binary was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub os: Os,
    pub arch: Arch,
    pub nacl_arch: Arch,
    pub prod_version: String,
    pub product: Product,
}

impl Default for UpdateRequest {
    fn default() -> Self {
        let arch = Arch::current();

        UpdateRequest {
            os: Os::current(),
            arch,
            nacl_arch: arch,
            prod_version: DEFAULT_PROD_VERSION.to_string(),
            product: Product::Chromium,
        }
    }
}

impl UpdateRequest {
    pub fn download_url(&self, id: &ExtensionId) -> String {
        let mut url = format!("{UPDATE_SERVICE_URL}?response=redirect");
        url += &format!("&os={}", self.os);
        url += &format!("&arch={}", self.arch);
        // crbug.com/709147: os_arch mirrors arch
        url += &format!("&os_arch={}", self.arch);
        url += &format!("&nacl_arch={}", self.nacl_arch);
        url += &format!("&prod={}", self.product);
        url += "&prodchannel=unknown";
        url += &format!("&prodversion={}", self.prod_version);
        url += "&acceptformat=crx2,crx3";
        url += &format!("&x=id%3D{id}%26uc");
        url
    }
}

/// Decodes `%XX` escapes for display. Malformed escapes are kept verbatim.
pub fn percent_decode(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}
