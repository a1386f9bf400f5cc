// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use lumen_io::{BinaryDumpDirectory, ImportMode, LightmassConfig};

#[test]
fn test_prepare_fresh_clears_previous_build() {
    // --- 1. ARRANGE ---
    let temp = tempfile::tempdir().expect("temp dir");
    let dump = BinaryDumpDirectory::new(temp.path().join("Logs").join("Lighting_Lightmass"));
    dump.write("old_a.bin", b"a").expect("write a");
    std::fs::create_dir_all(dump.path().join("nested")).expect("mkdir");
    dump.write("nested/old_b.bin", b"b").expect("write b");
    assert_eq!(dump.file_count(), 2);

    // --- 2. ACT ---
    let removed = dump.prepare_fresh().expect("clear");

    // --- 3. ASSERT ---
    assert_eq!(removed, 2);
    assert!(dump.path().is_dir());
    assert_eq!(dump.file_count(), 0);
}

#[test]
fn test_prepare_fresh_creates_missing_directory() {
    let temp = tempfile::tempdir().expect("temp dir");
    let dump = BinaryDumpDirectory::new(temp.path().join("missing"));

    assert_eq!(dump.prepare_fresh().expect("create"), 0);
    assert!(dump.path().is_dir());
}

#[test]
fn test_config_save_then_load() {
    // --- 1. ARRANGE ---
    let temp = tempfile::tempdir().expect("temp dir");
    let path = temp.path().join("lightmass.ron");
    let mut config = LightmassConfig::default();
    config.debug.import_mode = ImportMode::Immediate;
    config.export.items_per_tick = 7;

    // --- 2. ACT ---
    config.save(&path).expect("save");
    let loaded = LightmassConfig::load(&path).expect("load");

    // --- 3. ASSERT ---
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_config_falls_back_to_defaults() {
    let temp = tempfile::tempdir().expect("temp dir");
    let config = LightmassConfig::load_or_default(temp.path().join("absent.ron"));
    assert_eq!(config, LightmassConfig::default());
}
