use dirstat_core::{
    ConfigError, ConfigFile, EntryType, ExclusionFilter, MountTable, PathMetadata, ScanError,
    ScanTarget, Stat, TargetConfig, escape_path,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_entry_type_for_captured_directory() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join("sub")).unwrap();

    let meta = PathMetadata::capture(temp.path(), OsStr::new("sub"));
    assert!(meta.exists());
    assert!(meta.is_dir());
    assert_eq!(meta.entry_type(), Some(EntryType::Directory));
    assert!(meta.device().is_some());
}

#[test]
fn test_capture_path_uses_final_component_as_name() {
    let temp = TempDir::new().unwrap();
    let meta = PathMetadata::capture_path(temp.path());
    assert_eq!(meta.name(), temp.path().file_name().unwrap());
    assert_eq!(meta.path(), temp.path());
}

#[test]
fn test_stat_from_metadata() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("data.bin");
    std::fs::write(&file, vec![0u8; 1234]).unwrap();

    let stat = Stat::from_metadata(&std::fs::symlink_metadata(&file).unwrap());
    assert_eq!(stat.size, 1234);
    assert_eq!(stat.entry_type(), EntryType::File);
    assert!(stat.links >= 1);
    assert!(stat.mtime > 0);
}

#[cfg(unix)]
#[test]
fn test_non_utf8_names_escaped_bytewise() {
    use std::os::unix::ffi::OsStrExt;

    let name = OsStr::from_bytes(b"bad\xffname");
    assert_eq!(escape_path(name), "bad%FFname");
}

#[test]
fn test_mount_table_from_listing() {
    let listing = "\
Filesystem 1024-blocks Used Available Capacity Mounted on
/dev/mapper/root 100 50 50 50% /
/dev/sdb1 100 50 50 50% /home
server:/export 100 50 50 50% /mnt/nfs
";
    let table = MountTable::parse(listing).unwrap();
    assert_eq!(table.default_label(), "/dev/mapper/root");
    assert_eq!(table.label_for(Path::new("/home/user")), "/dev/sdb1");
    assert_eq!(table.label_for(Path::new("/mnt/nfs/share")), "server:/export");
    assert_eq!(table.label_for(Path::new("/usr")), "/dev/mapper/root");
}

#[test]
fn test_mount_table_requires_root() {
    assert!(matches!(
        MountTable::parse("Filesystem Mounted on\n"),
        Err(ScanError::NoRootDevice)
    ));
}

#[test]
fn test_exclusion_filter_semantics() {
    let filter = ExclusionFilter::new(["/data/tmp", ".cache"]);

    assert!(filter.is_excluded(Path::new("/data/tmp")));
    assert!(filter.is_excluded(Path::new("/home/user/.cache")));
    assert!(filter.is_excluded(Path::new("/home/user/pip.cache")));
    assert!(!filter.is_excluded(Path::new("/data/tmp2")));
    assert!(!filter.is_excluded(Path::new("/home/user/.cache/x")));
}

#[test]
fn test_config_file_load_from_disk() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    std::fs::create_dir(&data).unwrap();

    let config_path = temp.path().join("dirstat.json");
    let json = format!(
        r#"{{
            "options": {{ "scan_mounted": true, "verbose": true }},
            "global_exclude": ["lost+found"],
            "index_directories": [
                {{ "index": "{}", "cache": "{}", "compress": true }}
            ]
        }}"#,
        data.display(),
        temp.path().join("data.cache.gz").display()
    );
    std::fs::write(&config_path, json).unwrap();

    let config = ConfigFile::load(&config_path).unwrap();
    assert!(config.options.verbose);
    assert!(!config.options.debug);

    let targets = config.targets(&config_path).unwrap();
    assert_eq!(targets.len(), 1);
    assert!(targets[0].scan_mounted);
    assert_eq!(targets[0].exclude, vec!["lost+found".to_string()]);

    let mounts = MountTable::new("/dev/root", Vec::<(String, String)>::new());
    let target = ScanTarget::resolve(&targets[0], &mounts).unwrap();
    assert!(target.compress);
    assert!(target.scan_mounted);
    assert_eq!(target.root_label, "/dev/root");
}

#[test]
fn test_config_file_missing() {
    let result = ConfigFile::load(Path::new("/definitely/not/here.json"));
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[test]
fn test_target_label_uses_mount_table() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().to_path_buf();
    let mounts = MountTable::new(
        "/dev/root",
        [(root.to_string_lossy().to_string(), "/dev/scratch")],
    );

    let target = ScanTarget::resolve(&TargetConfig::new(&root), &mounts).unwrap();
    assert_eq!(target.root_label, "/dev/scratch");
    assert_eq!(target.cache, root.join(PathBuf::from(".qdirstat.cache.gz")));
}
