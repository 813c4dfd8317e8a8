// Tests for theme persistence: the light default and toggling across
// reloads.

use outreach::theme::{Theme, ThemeManager};
use tempfile::tempdir;

#[test]
fn test_theme_defaults_to_light() {
    let dir = tempdir().unwrap();
    let manager = ThemeManager::in_dir(&dir.path().to_path_buf()).unwrap();

    assert_eq!(manager.load().unwrap(), Theme::Light);
}

#[test]
fn test_toggle_persists_across_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().to_path_buf();

    {
        let manager = ThemeManager::in_dir(&path).unwrap();
        assert_eq!(manager.toggle().unwrap(), Theme::Dark);
    }

    // A fresh manager over the same directory sees the saved theme
    let reloaded = ThemeManager::in_dir(&path).unwrap();
    assert_eq!(reloaded.load().unwrap(), Theme::Dark);

    // And toggling again returns to light
    assert_eq!(reloaded.toggle().unwrap(), Theme::Light);
    assert_eq!(reloaded.load().unwrap(), Theme::Light);
}

#[test]
fn test_save_is_explicit_too() {
    let dir = tempdir().unwrap();
    let manager = ThemeManager::in_dir(&dir.path().to_path_buf()).unwrap();

    manager.save(Theme::Dark).unwrap();
    assert_eq!(manager.load().unwrap(), Theme::Dark);
}
