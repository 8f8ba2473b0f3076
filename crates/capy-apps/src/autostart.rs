//! Autostart state from the XDG autostart directories.

use crate::desktop_entry::read_desktop_group;
use crate::paths::get_autostart_directories;
use capy_catalog::{Result, SessionBackend};
use std::path::{Path, PathBuf};

/// `SessionBackend` answering from `~/.config/autostart` and the system
/// autostart directories.
pub struct XdgAutostart {
    dirs: Vec<PathBuf>,
}

impl Default for XdgAutostart {
    fn default() -> Self {
        Self::new(get_autostart_directories())
    }
}

impl XdgAutostart {
    /// `dirs` in priority order, user directory first.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl SessionBackend for XdgAutostart {
    fn is_autostart(&self, desktop: &str) -> Result<bool> {
        let Some(file_name) = Path::new(desktop).file_name() else {
            return Ok(false);
        };

        // The first directory holding the file decides, even if it disables it.
        let Some(entry) = self
            .dirs
            .iter()
            .map(|dir| dir.join(file_name))
            .find(|path| path.exists())
        else {
            return Ok(false);
        };

        let Some(group) = read_desktop_group(&entry) else {
            return Ok(false);
        };
        let is_false = |key: &str| group.get(key).is_some_and(|v| v == "false");
        let is_true = |key: &str| group.get(key).is_some_and(|v| v == "true");

        Ok(!is_true("Hidden") && !is_false("X-GNOME-Autostart-enabled"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_autostart_lookup() {
        let root = tempfile::tempdir().unwrap();
        let user = root.path().join("user");
        let system = root.path().join("system");
        fs::create_dir_all(&user).unwrap();
        fs::create_dir_all(&system).unwrap();

        fs::write(system.join("nm-applet.desktop"), "[Desktop Entry]\nType=Application\nName=NM\n").unwrap();
        fs::write(system.join("tracker.desktop"), "[Desktop Entry]\nType=Application\nName=Tracker\n").unwrap();
        fs::write(user.join("tracker.desktop"), "[Desktop Entry]\nHidden=true\n").unwrap();
        fs::write(
            user.join("syncthing.desktop"),
            "[Desktop Entry]\nType=Application\nName=Syncthing\nX-GNOME-Autostart-enabled=false\n",
        )
        .unwrap();

        let session = XdgAutostart::new(vec![user, system]);
        assert!(session.is_autostart("/usr/share/applications/nm-applet.desktop").unwrap());
        assert!(!session.is_autostart("/usr/share/applications/tracker.desktop").unwrap());
        assert!(!session.is_autostart("/usr/share/applications/syncthing.desktop").unwrap());
        assert!(!session.is_autostart("/usr/share/applications/gimp.desktop").unwrap());
        assert!(!session.is_autostart("").unwrap());
    }
}
