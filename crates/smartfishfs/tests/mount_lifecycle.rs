//! End-to-end mount scenarios, driven the way a host layer would drive them.

use std::sync::Arc;
use std::thread;

use smartfishfs::{
    FileReader, FsError, FsRegistry, MountConfig, MountState, NodeId, NodeKind, NodeTree,
    README_CONTENT, README_NAME, SMARTFISHFS_MAGIC, SmartfishFs, mount, unmount,
};

#[test]
fn readme_scenario() {
    let sb = mount(&MountConfig::default()).unwrap();
    assert_eq!(sb.root().unwrap(), NodeId::ROOT);
    assert_eq!(sb.magic(), SMARTFISHFS_MAGIC);

    let readme = sb.lookup(NodeId::ROOT, README_NAME).unwrap();
    assert_eq!(readme, NodeId::new(2));

    let len = README_CONTENT.len() as u64;
    let info = sb.get(readme).unwrap();
    assert!(info.is_file());
    assert_eq!(info.size, len);
    assert_eq!(info.mode.bits(), 0o100644);

    let out = sb.read(readme, 0, 1024).unwrap();
    assert_eq!(out.data, README_CONTENT);
    assert_eq!(out.new_offset, len);

    let out = sb.read(readme, len, 1024).unwrap();
    assert!(out.data.is_empty());
    assert_eq!(out.new_offset, len);

    unmount(&sb);
    assert!(matches!(sb.get(readme), Err(FsError::NotFound(_))));
}

#[test]
fn duplicate_create_scenario() {
    let mut tree = NodeTree::new();
    let root = tree.create_root().unwrap();
    tree.create_child(root, "readme.txt", NodeKind::File, README_CONTENT)
        .unwrap();

    let err = tree
        .create_child(root, "readme.txt", NodeKind::File, b"other")
        .unwrap_err();
    assert!(matches!(err, FsError::AlreadyExists(_)));

    let entries: Vec<_> = tree.list_children(root).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "readme.txt");
    assert_eq!(tree.read_all(entries[0].id).unwrap(), README_CONTENT);
}

#[test]
fn root_of_fresh_tree() {
    let mut tree = NodeTree::new();
    tree.create_root().unwrap();
    let root = tree.get(NodeId::ROOT).unwrap();
    assert!(root.is_dir());
    assert_eq!(root.nlink, 2);
    assert_eq!(root.children, 0);
    assert_eq!(root.mode.bits(), 0o040755);
}

#[test]
fn chunked_reads_roundtrip() {
    let content: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    let mut tree = NodeTree::new();
    let root = tree.create_root().unwrap();
    let id = tree.create_file(root, "blob", &content).unwrap();

    for chunk in [1usize, 7, 4096, 20_000] {
        let mut offset = 0;
        let mut collected = Vec::new();
        loop {
            let out = tree.read(id, offset, chunk).unwrap();
            if out.is_eof() {
                break;
            }
            assert!(out.data.len() <= chunk);
            collected.extend_from_slice(&out.data);
            offset = out.new_offset;
        }
        assert_eq!(collected, content, "chunk size {chunk}");
    }
}

#[test]
fn statistics_for_stat_queries() {
    let sb = mount(&MountConfig::default().with_block_size(8192)).unwrap();
    let stats = sb.statistics();
    assert_eq!(stats.block_size, 8192);
    assert_eq!(stats.magic, SMARTFISHFS_MAGIC);
    assert_eq!(stats.total_blocks, stats.free_blocks);
    assert!(stats.total_blocks > 0);
    assert_eq!(stats.total_nodes, 2);
}

#[test]
fn mount_from_toml() {
    let config = MountConfig::from_toml_str(
        r#"
        populate_readme = false

        [[files]]
        path = "etc/motd"
        content = "welcome\n"
        "#,
    )
    .unwrap();
    let sb = mount(&config).unwrap();

    assert!(sb.lookup(NodeId::ROOT, README_NAME).unwrap_err().is_not_found());
    let etc = sb.lookup(NodeId::ROOT, "etc").unwrap();
    let motd = sb.lookup(etc, "motd").unwrap();
    assert_eq!(sb.read_all(motd).unwrap(), b"welcome\n");
    assert_eq!(sb.get(motd).unwrap().parent, Some(etc));
}

#[test]
fn mount_binary_seed_from_toml() {
    let config = MountConfig::from_toml_str(
        r#"
        [[files]]
        path = "firmware/blob.bin"
        content = [0, 159, 146, 150, 255]
        "#,
    )
    .unwrap();
    let sb = mount(&config).unwrap();

    let blob = sb.resolve("firmware/blob.bin").unwrap();
    let out = sb.read(blob, 1, 3).unwrap();
    assert_eq!(out.data, [0x9f, 0x92, 0x96]);
    assert_eq!(out.new_offset, 4);
    assert_eq!(sb.read_all(blob).unwrap(), [0x00, 0x9f, 0x92, 0x96, 0xff]);
}

#[test]
fn concurrent_readers_share_one_mount() {
    let config = MountConfig::default().with_file("data/big.bin", "x".repeat(64 * 1024));
    let sb = mount(&config).unwrap();
    let big = sb.resolve("/data/big.bin").unwrap();

    thread::scope(|s| {
        for t in 0..8u64 {
            let sb = Arc::clone(&sb);
            s.spawn(move || {
                for i in 0..100u64 {
                    let offset = (t * 100 + i) * 37;
                    let out = sb.read(big, offset, 512).unwrap();
                    assert!(out.data.iter().all(|&b| b == b'x'));
                    assert_eq!(sb.lookup(NodeId::ROOT, "data").unwrap(), NodeId::new(3));
                    assert_eq!(sb.list_children(NodeId::ROOT).unwrap().len(), 2);
                }
            });
        }
    });

    unmount(&sb);
    assert!(sb.read(big, 0, 1).unwrap_err().is_not_found());
}

#[test]
fn registry_drives_lifecycle() {
    let mut registry = FsRegistry::new();
    registry.register(SmartfishFs::new()).unwrap();

    let fs = registry.lookup("smartfishfs").unwrap();
    let a = fs.mount(&MountConfig::default()).unwrap();
    let b = fs.mount(&MountConfig::default().without_readme()).unwrap();

    // Independent mounts, independent trees.
    assert!(a.lookup(NodeId::ROOT, README_NAME).is_ok());
    assert!(b.lookup(NodeId::ROOT, README_NAME).is_err());

    fs.unmount(&a);
    assert_eq!(a.state(), MountState::Unmounted);
    assert!(b.is_mounted());
    assert!(b.root().is_ok());
}

#[test]
fn errors_convert_to_io() {
    let sb = mount(&MountConfig::default()).unwrap();
    let err: std::io::Error = sb.read(NodeId::ROOT, 0, 1).unwrap_err().into();
    assert_eq!(err.kind(), std::io::ErrorKind::IsADirectory);

    let readme = sb.lookup(NodeId::ROOT, README_NAME).unwrap();
    let err: std::io::Error = sb.list_children(readme).unwrap_err().into();
    assert_eq!(err.kind(), std::io::ErrorKind::NotADirectory);
}
