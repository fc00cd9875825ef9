//! Archive fixtures shaped like flexControl exports.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use flexzip::SampleConfig;
use flexzip::zip::ZipWriter;
use std::path::{Path, PathBuf};

pub const INSTRUMENT_ID: &str = "8604832.05252";

/// Size of the generated spectra: 5,351 data points
pub const FID_BYTES: usize = 21_404;

/// Fields that differ between the generated samples
#[derive(Clone)]
pub struct SampleFixture {
    pub root: &'static str,
    pub id_raw: &'static str,
    pub sample_id: &'static str,
    pub target_raw: &'static str,
    pub target_id: &'static str,
    pub acquired: &'static str,
    pub position: &'static str,
    pub flex_control: &'static str,
}

/// Six samples spread over two runs and two targets
pub fn six_samples() -> Vec<SampleFixture> {
    let run_2023 = |root, id_raw, sample_id, acquired, position| SampleFixture {
        root,
        id_raw,
        sample_id,
        target_raw: "GFE4FEFFA_0C05_4941_B01D_B2DEDEF2F95F",
        target_id: "fe4feffa0c054941b01db2dedef2f95f",
        acquired,
        position,
        flex_control: "3.4.207.20",
    };
    let run_2020 = |root, id_raw, sample_id, acquired| SampleFixture {
        root,
        id_raw,
        sample_id,
        target_raw: "G649EC898_D5E9_4625_9734_38813E13596C",
        target_id: "649ec898d5e94625973438813e13596c",
        acquired,
        position: "E1",
        flex_control: "3.4.204.10",
    };

    vec![
        run_2023(
            "23050678/0_E1/1/1SLin",
            "16824b6e-acf1-4b9d-861c-d7d18b6a1237",
            "16824b6eacf14b9d861cd7d18b6a1237",
            "2023-02-22T12:47:40.909+01:00",
            "E1",
        ),
        run_2023(
            "23050678/0_E2/1/1SLin",
            "d7dca0ef-faf2-47d2-abb8-6188f4e635ed",
            "d7dca0effaf247d2abb86188f4e635ed",
            "2023-02-22T12:47:45.482+01:00",
            "E2",
        ),
        run_2023(
            "23050679/0_E3/1/1SLin",
            "04d447db-393d-4229-81e8-c10c90ec09b2",
            "04d447db393d422981e8c10c90ec09b2",
            "2023-02-22T12:47:50.935+01:00",
            "E3",
        ),
        run_2023(
            "23050679/0_E4/1/1SLin",
            "fb60fc50-f999-42bb-a40e-0bcc5e262e1d",
            "fb60fc50f99942bba40e0bcc5e262e1d",
            "2023-02-22T12:48:05.828+01:00",
            "E4",
        ),
        run_2020(
            "Clostridium difficile 239295-027/D3/0_E1/1/1SLin",
            "ce9421f2-726c-4c5a-a68d-d08a4b61477d",
            "ce9421f2726c4c5aa68dd08a4b61477d",
            "2020-03-15T18:34:25.353+01:00",
        ),
        run_2020(
            "Clostridium difficile 239295-027/D3/0_E1/2/1SLin",
            "ddd4be61-2b6d-42b9-ada6-e4df0634db79",
            "ddd4be612b6d42b9ada6e4df0634db79",
            "2020-03-15T18:34:41.306+01:00",
        ),
    ]
}

pub fn acqu(fixture: &SampleFixture) -> Vec<u8> {
    let path = format!(r"D:\Data\{}", fixture.root.replace('/', r"\"));
    [
        "##TITLE= xmass parameter file".to_string(),
        "##JCAMPDX= 5.0".to_string(),
        "##DATATYPE= Parameter Values".to_string(),
        "##ORIGIN= Bruker Daltonik GmbH".to_string(),
        "##OWNER= <maldi>".to_string(),
        format!("$$ {path}\\acqu"),
        format!("##$AQ_DATE= <{}>", fixture.acquired),
        "##$DIGTYP= 19".to_string(),
        format!("##$FCVer= <flexControl {}>", fixture.flex_control),
        format!("##$ID_raw= <{}>", fixture.id_raw),
        format!("##$InstrID= <{INSTRUMENT_ID}>"),
        "##$InstTyp= 9".to_string(),
        format!("##$PATCHNO= <{}>", fixture.position),
        format!("##$PATH= <{path}>"),
        format!("##$TgIDS= <{}>", fixture.target_raw),
        "##END= ".to_string(),
        String::new(),
    ]
    .join("\r\n")
    .into_bytes()
}

pub fn proc() -> Vec<u8> {
    [
        "##TITLE= xmass parameter file",
        "##JCAMPDX= 5.0",
        "##$Acquver= <AIDA3.4.207.20>",
        "##$CLDATE= <2020-03-12T09:15:02.118+01:00>",
        "##$ML1= 8612438.95491467",
        "##END= ",
        "",
    ]
    .join("\r\n")
    .into_bytes()
}

/// Deterministic spectrum bytes, distinct per seed
pub fn fid(seed: u32, len: usize) -> Vec<u8> {
    (0..len as u32)
        .map(|i| (i.wrapping_mul(7919).wrapping_add(seed * 31) % 251) as u8)
        .collect()
}

/// Files of one sample, relative to its root
pub fn sample_files(fixture: &SampleFixture, seed: u32) -> Vec<(String, Vec<u8>)> {
    let acqu = acqu(fixture);
    vec![
        ("acqu".to_string(), acqu.clone()),
        ("acqus".to_string(), acqu),
        ("fid".to_string(), fid(seed, FID_BYTES)),
        ("sptype".to_string(), b"tof\r\n".to_vec()),
        ("pdata/1/proc".to_string(), proc()),
        ("pdata/1/procs".to_string(), proc()),
    ]
}

/// Prefix every path with `root/`
pub fn under(root: &str, files: Vec<(String, Vec<u8>)>) -> Vec<(String, Vec<u8>)> {
    files
        .into_iter()
        .map(|(path, data)| (format!("{root}/{path}"), data))
        .collect()
}

pub fn archive_bytes(files: &[(String, Vec<u8>)]) -> Vec<u8> {
    let modified = Utc.with_ymd_and_hms(2023, 3, 1, 8, 0, 0).unwrap();
    let mut writer = ZipWriter::new();
    for (path, data) in files {
        writer.add_file(path, data, &modified).unwrap();
    }
    writer.finish().unwrap()
}

pub fn write_archive(dir: &Path, name: &str, files: &[(String, Vec<u8>)]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, archive_bytes(files)).unwrap();
    path
}

/// Every file of the six fixture samples, plus directory entries and a
/// stray file outside any sample
pub fn six_sample_archive(dir: &Path) -> PathBuf {
    let mut files = vec![
        ("23050678/".to_string(), Vec::new()),
        ("23050678/notes.txt".to_string(), b"run notes".to_vec()),
    ];
    for (seed, fixture) in six_samples().iter().enumerate() {
        files.extend(under(fixture.root, sample_files(fixture, seed as u32)));
    }
    write_archive(dir, "samples-valid.zip", &files)
}

pub fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 3, 1, 12, 0, 0).unwrap()
}

pub fn config() -> SampleConfig {
    SampleConfig::default().with_reference_time(reference_time())
}
