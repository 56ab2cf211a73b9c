//! File and configuration fixtures

use id3::{Tag, TagLike, Version};
use songtag_ai::RunConfig;
use std::path::Path;
use std::time::Duration;

pub const TUM_HI_HO_RESPONSE: &str = r#"{
  "title": "Tum Hi Ho",
  "artists": "Arijit Singh",
  "album": "Aashiqui 2",
  "year": 2013,
  "composer": "Mithoon",
  "genre": "Indian Pop",
  "language": "Hindi"
}"#;

/// Write an untagged MP3: a few MPEG-1 Layer III frame headers and silence
pub fn write_mp3(path: &Path) {
    let mut data = Vec::new();
    for _ in 0..4 {
        data.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
        data.extend_from_slice(&[0u8; 413]);
    }
    std::fs::write(path, data).unwrap();
}

/// Write an MP3 that already carries a title and artist
pub fn write_tagged_mp3(path: &Path, title: &str, artist: &str) {
    write_mp3(path);
    let mut tag = Tag::new();
    tag.set_title(title);
    tag.set_artist(artist);
    tag.write_to_path(path, Version::Id3v23).unwrap();
}

// =============================================================================
// Ogg Opus
// =============================================================================

const OGG_CRC_POLY: u32 = 0x04c1_1db7;
const OGG_SERIAL: u32 = 0x5354_4147;
const OPUS_PRE_SKIP: u16 = 312;

const BOS: u8 = 0x02;
const EOS: u8 = 0x04;

/// Ogg page checksum (CRC-32, polynomial 0x04c11db7, no reflection)
fn ogg_crc(data: &[u8]) -> u32 {
    let mut crc = 0u32;
    for &byte in data {
        crc ^= (byte as u32) << 24;
        for _ in 0..8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ OGG_CRC_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// One Ogg page carrying a single complete packet shorter than 255 bytes
fn ogg_page(header_type: u8, granule: u64, sequence: u32, packet: &[u8]) -> Vec<u8> {
    assert!(packet.len() < 255);

    let mut page = Vec::with_capacity(28 + packet.len());
    page.extend_from_slice(b"OggS");
    page.push(0);
    page.push(header_type);
    page.extend_from_slice(&granule.to_le_bytes());
    page.extend_from_slice(&OGG_SERIAL.to_le_bytes());
    page.extend_from_slice(&sequence.to_le_bytes());
    page.extend_from_slice(&[0; 4]);
    page.push(1);
    page.push(packet.len() as u8);
    page.extend_from_slice(packet);

    let crc = ogg_crc(&page);
    page[22..26].copy_from_slice(&crc.to_le_bytes());
    page
}

fn opus_head() -> Vec<u8> {
    let mut head = b"OpusHead".to_vec();
    head.push(1); // version
    head.push(2); // channels
    head.extend_from_slice(&OPUS_PRE_SKIP.to_le_bytes());
    head.extend_from_slice(&48_000u32.to_le_bytes());
    head.extend_from_slice(&0i16.to_le_bytes()); // output gain
    head.push(0); // channel mapping family
    head
}

fn opus_tags(comments: &[(&str, &str)]) -> Vec<u8> {
    let vendor = b"songtag-tests";
    let mut tags = b"OpusTags".to_vec();
    tags.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    tags.extend_from_slice(vendor);
    tags.extend_from_slice(&(comments.len() as u32).to_le_bytes());
    for (key, value) in comments {
        let entry = format!("{}={}", key, value);
        tags.extend_from_slice(&(entry.len() as u32).to_le_bytes());
        tags.extend_from_slice(entry.as_bytes());
    }
    tags
}

/// Write a minimal Ogg Opus stream: OpusHead, OpusTags and one 20 ms audio
/// packet (CELT fullband, stereo)
pub fn write_opus(path: &Path, comments: &[(&str, &str)]) {
    let mut audio = vec![0xFC];
    audio.extend_from_slice(&[0u8; 40]);

    let mut data = Vec::new();
    data.extend(ogg_page(BOS, 0, 0, &opus_head()));
    data.extend(ogg_page(0, 0, 1, &opus_tags(comments)));
    data.extend(ogg_page(EOS, 960 + OPUS_PRE_SKIP as u64, 2, &audio));
    std::fs::write(path, data).unwrap();
}

/// Run configuration with no pacing delay
pub fn fast_config(input: &Path, output: &Path) -> RunConfig {
    let mut config = RunConfig::new(input, output);
    config.delay = Duration::ZERO;
    config
}
