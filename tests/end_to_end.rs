mod common;

use common::{image_response, png_bytes, studio, ScriptedDecoder, ScriptedGenerator};
use std::fs;
use std::sync::Arc;
use vcover::{CoverError, DisplayImage};

#[tokio::test]
async fn four_second_clip_to_saved_cover() {
    let png = png_bytes();
    let decoder = Arc::new(ScriptedDecoder::video(4.0, 720, 1280));
    let generator = Arc::new(ScriptedGenerator::responding(image_response(&[&png])));
    let studio = studio(decoder.clone(), generator.clone());
    let mut session = studio.new_session();

    session.upload(studio.extractor(), b"four seconds of video".to_vec()).await.unwrap();
    assert_eq!(decoder.seeks(), vec![1.0]);
    let frame = session.frame().unwrap();
    assert_eq!((frame.width, frame.height), (720, 1280));
    assert!(matches!(session.display_image(), Some(DisplayImage::Frame(_))));

    assert!(session.select_preset("CYBER"));
    session.set_title("GLOW");
    assert!(session.generate(studio.designer()).await.unwrap());

    let request = &generator.requests()[0];
    assert!(request.instruction.contains("GLOW"));
    assert!(request.instruction.contains(&studio.catalog().find("CYBER").unwrap().prompt));

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join(&studio.config().output_name);
    session.result().unwrap().save(&out).unwrap();

    assert_eq!(out.file_name().unwrap(), "vcover-pro.png");
    assert_eq!(fs::read(&out).unwrap(), png);
    assert!(matches!(session.display_image(), Some(DisplayImage::Cover(_))));
}

#[tokio::test]
async fn corrupt_upload_never_enables_generation() {
    let decoder = Arc::new(ScriptedDecoder::corrupt("Invalid data found when processing input"));
    let generator = Arc::new(ScriptedGenerator::responding(image_response(&[b"png"])));
    let studio = studio(decoder, generator.clone());
    let mut session = studio.new_session();

    let err = session.upload(studio.extractor(), b"video/mp4 but garbage".to_vec()).await.unwrap_err();

    assert!(matches!(err, CoverError::UnsupportedFormat { .. }));
    assert!(!session.can_generate());
    assert!(!session.generate(studio.designer()).await.unwrap());
    assert!(generator.requests().is_empty());
    assert!(session.display_image().is_none());
}

#[tokio::test]
async fn new_upload_replaces_frame_and_clears_cover() {
    let decoder = Arc::new(ScriptedDecoder::video(2.0, 64, 64));
    let generator = Arc::new(ScriptedGenerator::responding(image_response(&[b"cover"])));
    let studio = studio(decoder.clone(), generator);
    let mut session = studio.new_session();

    session.upload(studio.extractor(), vec![1; 16]).await.unwrap();
    session.generate(studio.designer()).await.unwrap();
    assert!(session.result().is_some());

    session.upload(studio.extractor(), vec![2; 16]).await.unwrap();
    assert!(session.result().is_none());
    assert!(session.frame().is_some());
    assert_eq!(decoder.seeks(), vec![0.5, 0.5]);
}
