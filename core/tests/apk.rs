//! End-to-end checks: a synthesized APK (manifest + dex + native lib) is
//! written to disk, opened through [`Apk`], and queried like the shell does.

use std::fs;
use std::path::PathBuf;

use apkshell::Apk;

const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";

fn push_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Build a compiled manifest document:
///
/// ```xml
/// <manifest package="com.example.app">
///     <uses-permission android:name="android.permission.INTERNET" >
///     <application android:debuggable="true" android:name=".App">
///         <activity android:name=".Main">
///             <intent-filter><action android:name="android.intent.action.MAIN"/></intent-filter>
/// ```
mod axml_fixture {
    use super::*;

    #[derive(Default)]
    pub struct Doc {
        strings: Vec<String>,
        body: Vec<u8>,
    }

    pub struct StrAttr {
        pub ns: Option<&'static str>,
        pub name: &'static str,
        pub value: &'static str,
    }

    impl Doc {
        pub fn intern(&mut self, value: &str) -> u32 {
            if let Some(idx) = self.strings.iter().position(|s| s == value) {
                return idx as u32;
            }
            self.strings.push(value.to_owned());
            (self.strings.len() - 1) as u32
        }

        fn element_header(&mut self, chunk_type: u16, size: u32) {
            push_u16(&mut self.body, chunk_type);
            push_u16(&mut self.body, 0x10);
            push_u32(&mut self.body, size);
            push_u32(&mut self.body, 1);
            push_u32(&mut self.body, u32::MAX);
        }

        pub fn start_ns(&mut self, prefix: &str, uri: &str) -> &mut Self {
            let prefix = self.intern(prefix);
            let uri = self.intern(uri);
            self.element_header(0x0100, 24);
            push_u32(&mut self.body, prefix);
            push_u32(&mut self.body, uri);
            self
        }

        pub fn end_ns(&mut self, prefix: &str, uri: &str) -> &mut Self {
            let prefix = self.intern(prefix);
            let uri = self.intern(uri);
            self.element_header(0x0101, 24);
            push_u32(&mut self.body, prefix);
            push_u32(&mut self.body, uri);
            self
        }

        pub fn start(&mut self, name: &'static str, attrs: &[StrAttr]) -> &mut Self {
            let name = self.intern(name);
            let resolved: Vec<(u32, u32, u32)> = attrs
                .iter()
                .map(|attr| {
                    let ns = match attr.ns {
                        Some(uri) => self.intern(uri),
                        None => u32::MAX,
                    };
                    (ns, self.intern(attr.name), self.intern(attr.value))
                })
                .collect();

            self.element_header(0x0102, 36 + 20 * attrs.len() as u32);
            push_u32(&mut self.body, u32::MAX); // element namespace
            push_u32(&mut self.body, name);
            push_u16(&mut self.body, 0x14);
            push_u16(&mut self.body, 0x14);
            push_u16(&mut self.body, attrs.len() as u16);
            push_u16(&mut self.body, 0);
            push_u16(&mut self.body, 0);
            push_u16(&mut self.body, 0);

            for (ns, name, value) in resolved {
                push_u32(&mut self.body, ns);
                push_u32(&mut self.body, name);
                push_u32(&mut self.body, value);
                push_u16(&mut self.body, 8);
                self.body.push(0);
                self.body.push(0x03); // string typed value
                push_u32(&mut self.body, value);
            }

            self
        }

        pub fn end(&mut self, name: &'static str) -> &mut Self {
            let name = self.intern(name);
            self.element_header(0x0103, 24);
            push_u32(&mut self.body, u32::MAX);
            push_u32(&mut self.body, name);
            self
        }

        pub fn build(&self) -> Vec<u8> {
            let mut raw = Vec::new();
            let mut offsets = Vec::new();
            for string in &self.strings {
                offsets.push(raw.len() as u32);
                raw.push(string.chars().count() as u8);
                raw.push(string.len() as u8);
                raw.extend_from_slice(string.as_bytes());
                raw.push(0);
            }
            while raw.len() % 4 != 0 {
                raw.push(0);
            }

            let strings_start = 28 + 4 * self.strings.len() as u32;
            let mut pool = Vec::new();
            push_u16(&mut pool, 0x0001);
            push_u16(&mut pool, 0x001C);
            push_u32(&mut pool, strings_start + raw.len() as u32);
            push_u32(&mut pool, self.strings.len() as u32);
            push_u32(&mut pool, 0);
            push_u32(&mut pool, 1 << 8); // utf-8 flag
            push_u32(&mut pool, strings_start);
            push_u32(&mut pool, 0);
            for offset in &offsets {
                push_u32(&mut pool, *offset);
            }
            pool.extend_from_slice(&raw);

            let mut resource_map = Vec::new();
            push_u16(&mut resource_map, 0x0180);
            push_u16(&mut resource_map, 0x0008);
            push_u32(&mut resource_map, 8);

            let total = 8 + pool.len() + resource_map.len() + self.body.len();
            let mut out = Vec::new();
            push_u16(&mut out, 0x0003);
            push_u16(&mut out, 0x0008);
            push_u32(&mut out, total as u32);
            out.extend_from_slice(&pool);
            out.extend_from_slice(&resource_map);
            out.extend_from_slice(&self.body);
            out
        }
    }
}

fn build_manifest() -> Vec<u8> {
    use axml_fixture::{Doc, StrAttr};

    let mut doc = Doc::default();
    doc.start_ns("android", ANDROID_NS)
        .start(
            "manifest",
            &[StrAttr {
                ns: None,
                name: "package",
                value: "com.example.app",
            }],
        )
        .start(
            "uses-permission",
            &[StrAttr {
                ns: Some(ANDROID_NS),
                name: "name",
                value: "android.permission.INTERNET",
            }],
        )
        .end("uses-permission")
        .start(
            "application",
            &[
                StrAttr {
                    ns: Some(ANDROID_NS),
                    name: "debuggable",
                    value: "true",
                },
                StrAttr {
                    ns: Some(ANDROID_NS),
                    name: "name",
                    value: ".App",
                },
            ],
        )
        .start(
            "activity",
            &[StrAttr {
                ns: Some(ANDROID_NS),
                name: "name",
                value: ".Main",
            }],
        )
        .start("intent-filter", &[])
        .start(
            "action",
            &[StrAttr {
                ns: Some(ANDROID_NS),
                name: "name",
                value: "android.intent.action.MAIN",
            }],
        )
        .end("action")
        .end("intent-filter")
        .end("activity")
        .end("application")
        .end("manifest")
        .end_ns("android", ANDROID_NS);

    doc.build()
}

/// A single-class dex image: `com.example.Foo.bar()` returning void
fn build_dex() -> Vec<u8> {
    fn push_uleb(buf: &mut Vec<u8>, mut value: u32) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                buf.push(byte);
                break;
            }
            buf.push(byte | 0x80);
        }
    }

    let strings = [
        "Lcom/example/Foo;",
        "Ljava/lang/Object;",
        "V",
        "bar",
        "https://command.example.net/gate",
    ];

    let header_size = 0x70u32;
    let string_ids_off = header_size;
    let type_ids_off = string_ids_off + 4 * strings.len() as u32;
    let proto_ids_off = type_ids_off + 4 * 3;
    let method_ids_off = proto_ids_off + 12;
    let class_defs_off = method_ids_off + 8;
    let data_off = class_defs_off + 32;

    let mut data = Vec::new();
    let mut string_offsets = Vec::new();
    for string in strings {
        string_offsets.push(data_off + data.len() as u32);
        push_uleb(&mut data, string.chars().count() as u32);
        data.extend_from_slice(string.as_bytes());
        data.push(0);
    }

    while data.len() % 4 != 0 {
        data.push(0);
    }
    let code_off = data_off + data.len() as u32;
    push_u16(&mut data, 1); // registers
    push_u16(&mut data, 1); // ins
    push_u16(&mut data, 0); // outs
    push_u16(&mut data, 0); // tries
    push_u32(&mut data, 0); // debug info
    push_u32(&mut data, 1); // insns size
    push_u16(&mut data, 0x000e); // return-void

    while data.len() % 4 != 0 {
        data.push(0);
    }
    let class_data_off = data_off + data.len() as u32;
    push_uleb(&mut data, 0);
    push_uleb(&mut data, 0);
    push_uleb(&mut data, 1); // one direct method
    push_uleb(&mut data, 0);
    push_uleb(&mut data, 0); // method idx
    push_uleb(&mut data, 0x1); // public
    push_uleb(&mut data, code_off);

    let file_size = data_off + data.len() as u32;

    let mut image = Vec::new();
    image.extend_from_slice(b"dex\n035\0");
    push_u32(&mut image, 0); // checksum
    image.extend_from_slice(&[0u8; 20]);
    push_u32(&mut image, file_size);
    push_u32(&mut image, header_size);
    push_u32(&mut image, 0x12345678);
    push_u32(&mut image, 0);
    push_u32(&mut image, 0);
    push_u32(&mut image, 0);
    push_u32(&mut image, strings.len() as u32);
    push_u32(&mut image, string_ids_off);
    push_u32(&mut image, 3);
    push_u32(&mut image, type_ids_off);
    push_u32(&mut image, 1);
    push_u32(&mut image, proto_ids_off);
    push_u32(&mut image, 0);
    push_u32(&mut image, 0);
    push_u32(&mut image, 1);
    push_u32(&mut image, method_ids_off);
    push_u32(&mut image, 1);
    push_u32(&mut image, class_defs_off);
    push_u32(&mut image, data.len() as u32);
    push_u32(&mut image, data_off);

    for offset in string_offsets {
        push_u32(&mut image, offset);
    }
    // types: Foo, Object, void
    for type_string in [0u32, 1, 2] {
        push_u32(&mut image, type_string);
    }
    // proto ()V
    push_u32(&mut image, 2);
    push_u32(&mut image, 2);
    push_u32(&mut image, 0);
    // method Foo.bar
    push_u16(&mut image, 0);
    push_u16(&mut image, 0);
    push_u32(&mut image, 3);
    // class def
    push_u32(&mut image, 0);
    push_u32(&mut image, 0x1);
    push_u32(&mut image, 1);
    push_u32(&mut image, 0);
    push_u32(&mut image, u32::MAX);
    push_u32(&mut image, 0);
    push_u32(&mut image, class_data_off);
    push_u32(&mut image, 0);

    image.extend_from_slice(&data);
    image
}

fn build_archive(members: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut offsets = Vec::new();

    for (name, data) in members {
        offsets.push(out.len() as u32);
        push_u32(&mut out, 0x04034b50);
        push_u16(&mut out, 20);
        push_u16(&mut out, 0);
        push_u16(&mut out, 0); // stored
        push_u16(&mut out, 0);
        push_u16(&mut out, 0);
        push_u32(&mut out, 0);
        push_u32(&mut out, data.len() as u32);
        push_u32(&mut out, data.len() as u32);
        push_u16(&mut out, name.len() as u16);
        push_u16(&mut out, 0);
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(data);
    }

    let central_start = out.len() as u32;
    for ((name, data), offset) in members.iter().zip(&offsets) {
        push_u32(&mut out, 0x02014b50);
        push_u16(&mut out, 20);
        push_u16(&mut out, 20);
        push_u16(&mut out, 0);
        push_u16(&mut out, 0); // stored
        push_u16(&mut out, 0);
        push_u16(&mut out, 0);
        push_u32(&mut out, 0);
        push_u32(&mut out, data.len() as u32);
        push_u32(&mut out, data.len() as u32);
        push_u16(&mut out, name.len() as u16);
        push_u16(&mut out, 0);
        push_u16(&mut out, 0);
        push_u16(&mut out, 0);
        push_u16(&mut out, 0);
        push_u32(&mut out, 0);
        push_u32(&mut out, *offset);
        out.extend_from_slice(name.as_bytes());
    }
    let central_size = out.len() as u32 - central_start;

    push_u32(&mut out, 0x06054b50);
    push_u16(&mut out, 0);
    push_u16(&mut out, 0);
    push_u16(&mut out, members.len() as u16);
    push_u16(&mut out, members.len() as u16);
    push_u32(&mut out, central_size);
    push_u32(&mut out, central_start);
    push_u16(&mut out, 0);

    out
}

struct TempApk(PathBuf);

impl TempApk {
    fn create(tag: &str, bytes: &[u8]) -> TempApk {
        let path = std::env::temp_dir().join(format!(
            "apkshell-{}-{}.apk",
            tag,
            std::process::id()
        ));
        fs::write(&path, bytes).unwrap();
        TempApk(path)
    }
}

impl Drop for TempApk {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

fn sample_apk(tag: &str, extra: &[(&str, Vec<u8>)]) -> (TempApk, Apk) {
    let mut members = vec![
        ("AndroidManifest.xml", build_manifest()),
        ("classes.dex", build_dex()),
    ];
    members.extend(extra.iter().map(|(name, data)| (*name, data.clone())));

    let temp = TempApk::create(tag, &build_archive(&members));
    let apk = Apk::new(&temp.0).unwrap();
    (temp, apk)
}

#[test]
fn manifest_semantics_survive_the_pipeline() {
    let (_temp, apk) = sample_apk("manifest", &[]);
    let manifest = apk.manifest();

    assert_eq!(manifest.package.as_deref(), Some("com.example.app"));
    assert!(apk.is_debuggable());
    assert_eq!(
        manifest.application_class.as_deref(),
        Some("com.example.app.App")
    );
    assert_eq!(manifest.permissions, vec!["android.permission.INTERNET"]);

    let mains: Vec<&str> = manifest
        .main_activities()
        .map(|component| component.name.as_str())
        .collect();
    assert_eq!(mains, vec!["com.example.app.Main"]);

    assert!(apk.manifest_xml().contains("android:debuggable=\"true\""));
}

#[test]
fn classes_and_strings_come_from_the_images() {
    let (_temp, apk) = sample_apk("classes", &[]);

    let (name, dex) = apk.images().next().unwrap();
    assert_eq!(name, "classes.dex");
    assert_eq!(dex.classes(), vec!["com.example.Foo"]);

    let strings = dex.strings().unwrap();
    assert!(
        strings
            .iter()
            .any(|s| apkshell::patterns::is_url(s))
    );
}

#[test]
fn disassembly_reaches_through_the_archive() {
    let (_temp, apk) = sample_apk("disasm", &[]);

    let mut sink = Vec::new();
    assert!(apk.disassemble("com.example.Foo.bar", &mut sink).unwrap());
    let listing = String::from_utf8(sink).unwrap();
    assert!(listing.contains("method com.example.Foo.bar"));
    assert!(listing.contains("return-void"));

    let mut sink = Vec::new();
    assert!(!apk.disassemble("com.example.Foo.nope", &mut sink).unwrap());
}

#[test]
fn native_libs_are_listed_and_hashed() {
    let (_temp, apk) = sample_apk(
        "libs",
        &[(
            "lib/arm64-v8a/libnative.so",
            b"\x7fELF fake".to_vec(),
        )],
    );

    assert_eq!(apk.libs(), vec!["arm64-v8a/libnative.so"]);

    let hashes = apk.libs_hash().unwrap();
    assert_eq!(hashes.len(), 1);
    assert_eq!(hashes[0].0, "lib/arm64-v8a/libnative.so");
    assert_eq!(hashes[0].1.len(), 40);
}

#[test]
fn language_is_guessed_from_members() {
    let (_temp, apk) = sample_apk("lang-java", &[]);
    assert_eq!(apk.language(), "Java");

    let (_temp, apk) = sample_apk("lang-kotlin", &[("kotlin/kotlin.kotlin_builtins", vec![1])]);
    assert_eq!(apk.language(), "Kotlin");
}
