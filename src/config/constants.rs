// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Static tables for extension/MIME mapping, sniffing, and sanitization.

/// Extension (lowercase, no dot), MIME type implied by that extension.
/// Used both to decide "is this a photo/video" and as the baseline that
/// content sniffing (stage 1) is compared against.
pub const EXTENSION_MIME: [(&str, &str); 25] = [
  ("jpg", "image/jpeg"),
  ("jpeg", "image/jpeg"),
  ("png", "image/png"),
  ("gif", "image/gif"),
  ("webp", "image/webp"),
  ("bmp", "image/bmp"),
  ("heic", "image/heic"),
  ("heif", "image/heif"),
  ("tif", "image/tiff"),
  ("tiff", "image/tiff"),
  ("cr2", "image/tiff"),
  ("cr3", "image/x-canon-cr3"),
  ("nef", "image/tiff"),
  ("arw", "image/tiff"),
  ("dng", "image/tiff"),
  ("raf", "image/tiff"),
  ("rw2", "image/tiff"),
  ("svg", "image/svg+xml"),
  ("mp4", "video/mp4"),
  ("m4v", "video/mp4"),
  ("mov", "video/quicktime"),
  ("avi", "video/x-msvideo"),
  ("mkv", "video/x-matroska"),
  ("3gp", "video/3gpp"),
  ("webm", "video/webm"),
];

/// Extensions whose content is a TIFF-based container (including RAWs), which
/// the content sniffer commonly misclassifies. Stage 1 never renames these.
pub const TIFF_LIKE_EXTENSIONS: [&str; 9] =
  ["tif", "tiff", "cr2", "cr3", "nef", "arw", "dng", "raf", "rw2"];

/// Special-folder names (case-insensitive) whose contents are moved to
/// `Special Folders/<Name>` before any album strategy runs (spec 4.6.4).
pub const SPECIAL_FOLDER_NAMES: [&str; 5] =
  ["Archive", "Trash", "Failed Videos", "Bin", "Recently Deleted"];

/// Windows reserved device names; a sanitized album name matching one
/// (case-insensitively) gets `_file` appended (spec 4.6.1).
pub const WINDOWS_RESERVED_NAMES: [&str; 22] = [
  "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
  "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Characters invalid in a path segment on Windows; stripped during album-name
/// sanitization regardless of host OS, so output trees stay portable.
pub const WINDOWS_INVALID_CHARS: [char; 9] = ['<', '>', ':', '"', '|', '?', '*', '\\', '/'];

/// Localized "edited" suffixes Google Photos appends to a derived copy's
/// basename (spec 4.4). Matched case-insensitively against an NFC-normalized
/// basename.
pub const EDITED_SUFFIXES: [&str; 13] = [
  "-edited",
  "-edytowane",
  "-bearbeitet",
  "-bewerkt",
  "-編集済み",
  "-modificato",
  "-modifié",
  "-ha editado",
  "-editat",
  "-muokattu",
  "-redigerad",
  "-rediger",
  "-editada",
];
