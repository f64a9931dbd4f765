use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::process::Command;

use sonar_core::{ProxyError, ProxyRegistrar};

/// Route registrar backed by nginx server blocks.
///
/// One conf file per domain under the prefix's nginx include directory;
/// nginx is reloaded best-effort after every change so a stopped nginx
/// never blocks a switch.
pub struct NginxRoutes {
    servers_dir: PathBuf,
    nginx: Option<PathBuf>,
}

impl NginxRoutes {
    #[must_use]
    pub fn new(prefix: &Path) -> Self {
        Self {
            servers_dir: prefix.join("etc").join("nginx").join("servers"),
            nginx: which::which("nginx").ok(),
        }
    }

    #[cfg(test)]
    fn without_reload(servers_dir: PathBuf) -> Self {
        Self {
            servers_dir,
            nginx: None,
        }
    }

    fn conf_path(&self, domain: &str) -> PathBuf {
        self.servers_dir.join(format!("{domain}.conf"))
    }

    async fn reload(&self) {
        let Some(nginx) = &self.nginx else {
            debug!("nginx not found, skipping reload");
            return;
        };

        match Command::new(nginx).args(["-s", "reload"]).output().await {
            Ok(output) if output.status.success() => debug!("nginx reloaded"),
            Ok(output) => warn!(
                "nginx reload failed (is it running?): {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(error) => warn!("nginx reload could not be invoked: {error}"),
        }
    }
}

fn render_route(domain: &str, upstream: &str) -> String {
    format!(
        "# Managed by sonar; do not edit.\n\
         server {{\n\
         \x20   listen 80;\n\
         \x20   server_name {domain};\n\
         \n\
         \x20   location / {{\n\
         \x20       proxy_pass {upstream};\n\
         \x20       proxy_set_header Host $host;\n\
         \x20       proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;\n\
         \x20   }}\n\
         }}\n"
    )
}

#[async_trait]
impl ProxyRegistrar for NginxRoutes {
    async fn register_route(
        &self,
        domain: &str,
        upstream: &str,
        secure: bool,
    ) -> Result<(), ProxyError> {
        if secure {
            // TLS termination for .test domains is handled by the host
            // router's own certificates; this block only binds plain HTTP.
            debug!("Route {domain} requested secure; serving plain HTTP on the loopback");
        }

        std::fs::create_dir_all(&self.servers_dir)?;
        std::fs::write(self.conf_path(domain), render_route(domain, upstream))?;
        info!("Registered route {domain} -> {upstream}");

        self.reload().await;
        Ok(())
    }

    async fn remove_route(&self, domain: &str) -> Result<(), ProxyError> {
        let conf = self.conf_path(domain);
        if conf.is_file() {
            std::fs::remove_file(&conf)?;
            info!("Removed route {domain}");
            self.reload().await;
        } else {
            debug!("Route {domain} was not registered");
        }

        Ok(())
    }
}
