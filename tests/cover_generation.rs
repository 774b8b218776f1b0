mod common;

use common::{b64, image_response, studio, ScriptedDecoder, ScriptedGenerator};
use std::sync::Arc;
use vcover::{CapturedFrame, CoverDesigner, CoverError, StyleCatalog};

fn frame() -> CapturedFrame {
    CapturedFrame { bytes: vec![0xff, 0xd8, 0xff, 0xe0, 1, 2, 3], width: 1080, height: 1920 }
}

#[tokio::test]
async fn request_carries_frame_title_style_and_ratio() {
    let generator = Arc::new(ScriptedGenerator::responding(image_response(&[b"png"])));
    let designer = CoverDesigner::new(generator.clone(), "gemini-2.5-flash-image");
    let catalog = StyleCatalog::builtin();
    let cinema = catalog.find("CINEMA").unwrap();

    designer.generate_cover(Some(&frame()), "NIGHT DRIVE", cinema).await.unwrap();

    let requests = generator.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.model, "gemini-2.5-flash-image");
    assert_eq!(req.image_mime_type, "image/jpeg");
    assert_eq!(req.image_data, b64(&frame().bytes));
    assert_eq!(req.aspect_ratio, "9:16");
    assert!(req.instruction.contains("TITLE: \"NIGHT DRIVE\""));
    assert!(req.instruction.contains(&cinema.prompt));
}

#[tokio::test]
async fn empty_title_uses_default_word() {
    let generator = Arc::new(ScriptedGenerator::responding(image_response(&[b"png"])));
    let designer = CoverDesigner::new(generator.clone(), "m");
    let catalog = StyleCatalog::builtin();

    designer.generate_cover(Some(&frame()), "", catalog.default_preset()).await.unwrap();

    let instruction = &generator.requests()[0].instruction;
    assert!(instruction.contains("TITLE: \"MUSE\""));
    assert!(!instruction.contains("TITLE: \"\""));
}

#[tokio::test]
async fn configured_default_title_is_used() {
    let generator = Arc::new(ScriptedGenerator::responding(image_response(&[b"png"])));
    let designer = CoverDesigner::new(generator.clone(), "m").with_default_title("ENCORE");

    designer
        .generate_cover(Some(&frame()), "  ", StyleCatalog::builtin().default_preset())
        .await
        .unwrap();

    assert!(generator.requests()[0].instruction.contains("TITLE: \"ENCORE\""));
}

#[tokio::test]
async fn missing_frame_is_a_no_op() {
    let generator = Arc::new(ScriptedGenerator::responding(image_response(&[b"png"])));
    let designer = CoverDesigner::new(generator.clone(), "m");

    let out = designer.generate_cover(None, "T", StyleCatalog::builtin().default_preset()).await.unwrap();

    assert!(out.is_none());
    assert!(generator.requests().is_empty());
}

#[tokio::test]
async fn first_of_several_images_wins() {
    let generator = Arc::new(ScriptedGenerator::responding(image_response(&[&b"first"[..], &b"second"[..]])));
    let designer = CoverDesigner::new(generator, "m");

    let result = designer
        .generate_cover(Some(&frame()), "T", StyleCatalog::builtin().default_preset())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.bytes, b"first");
    assert_eq!(result.mime_type, "image/png");
}

#[tokio::test]
async fn text_only_response_fails_and_keeps_previous_cover() {
    let decoder = Arc::new(ScriptedDecoder::video(4.0, 90, 160));
    let good = Arc::new(ScriptedGenerator::responding(image_response(&[b"earlier cover"])));
    let studio_ok = studio(decoder.clone(), good);
    let mut session = studio_ok.new_session();
    session.upload(studio_ok.extractor(), vec![1; 32]).await.unwrap();
    assert!(session.generate(studio_ok.designer()).await.unwrap());

    let text_only = Arc::new(ScriptedGenerator::responding(image_response::<&[u8]>(&[])));
    let studio_bad = studio(decoder, text_only.clone());
    let err = session.generate(studio_bad.designer()).await.unwrap_err();

    assert!(matches!(err, CoverError::GenerationFailed { .. }));
    assert_eq!(text_only.requests().len(), 1);
    assert_eq!(session.result().unwrap().bytes, b"earlier cover");
    assert!(!session.is_loading());
    assert_eq!(session.error(), Some(vcover::error::GENERATION_FAILED_MESSAGE));
}

#[tokio::test]
async fn empty_candidates_fail() {
    let generator = Arc::new(ScriptedGenerator::responding(serde_json::json!({"candidates": []})));
    let designer = CoverDesigner::new(generator, "m");

    let err = designer
        .generate_cover(Some(&frame()), "T", StyleCatalog::builtin().default_preset())
        .await
        .unwrap_err();

    assert!(matches!(err, CoverError::GenerationFailed { .. }));
}

#[tokio::test]
async fn transport_error_is_single_try() {
    let decoder = Arc::new(ScriptedDecoder::video(4.0, 90, 160));
    let generator = Arc::new(ScriptedGenerator::failing("Gemini returned 503 Service Unavailable"));
    let studio = studio(decoder, generator.clone());
    let mut session = studio.new_session();
    session.upload(studio.extractor(), vec![1; 32]).await.unwrap();

    let err = session.generate(studio.designer()).await.unwrap_err();

    assert!(matches!(err, CoverError::GenerationFailed { .. }));
    assert_eq!(generator.requests().len(), 1);
    assert!(!session.is_loading());
    assert!(session.can_generate());
}

#[tokio::test]
async fn every_call_resends_the_frame() {
    let decoder = Arc::new(ScriptedDecoder::video(4.0, 90, 160));
    let generator = Arc::new(ScriptedGenerator::responding(image_response(&[b"png"])));
    let studio = studio(decoder, generator.clone());
    let mut session = studio.new_session();
    session.upload(studio.extractor(), vec![1; 32]).await.unwrap();

    session.generate(studio.designer()).await.unwrap();
    session.generate(studio.designer()).await.unwrap();

    let requests = generator.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
    assert_eq!(requests[0].image_data, session.frame().unwrap().to_base64());
}
