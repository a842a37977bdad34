//! Fixed prompt templates for the annotation and synthesis stages
//!
//! The templates are part of the reproducibility contract: together with
//! the pinned sampling options they make generated output stable across
//! reruns, so edits here invalidate comparability with existing cache
//! entries.

use annotator_common::elapsed_secs;

/// System instruction for the per-frame describer.
pub const FRAME_SYSTEM_PROMPT: &str = "\
You are a political scientist analyzing a single frame taken from a \
short-form social media video about an election campaign.

Provided data: one frame from the video.

For each category below, give a thorough, objective analysis focused on \
framing techniques, contextual cues, and visual emphasis.

1. Framing: shot types such as close-ups of politicians or wide-angle \
shots of crowds and public spaces; framing choices that highlight objects \
or gestures; split-screen layouts.

2. Visual Elements: background context such as public squares, government \
buildings, landscapes, vehicles, campaign events, flags, or office \
interiors; whether the scene is outdoors, indoors, or in a studio.

3. Activity: visible activities such as speeches, demonstrations, or \
scenes indicating voter participation.

4. Color Scheme: the palette and how it may evoke a European versus \
national context or convey mood.

5. Objects: prominent items such as campaign posters, ballots, \
microphones, national or EU flags, signs, podiums, or digital graphics; \
minor items such as on-screen text, emojis, or image-in-image features.

6. Subjects: visible individuals or groups, including politicians, \
influencers, campaigners, voters, activists, or citizens; note pets.

7. Screen Recording Indicators: whether the frame shows content from TV, \
video platforms, or other social media, or people filming another screen.";

/// User instruction paired with [`FRAME_SYSTEM_PROMPT`] for every frame.
pub const FRAME_USER_PROMPT: &str = "\
Analyze the provided video frame following the categories in the system \
prompt. Describe the visual elements, activities, and subjects in detail, \
and focus on how they contribute to the framing of the video content.";

/// System instruction for the synthesis generator.
pub const SYNTHESIS_SYSTEM_PROMPT: &str = "\
You are assisting a political scientist in analyzing a short-form social \
media video about an election campaign. You are given per-frame visual \
analysis results with on-screen text for each frame, the video metadata, \
and the speech transcript. Provide a structured, comprehensive political \
analysis that addresses every category below, clearly labeled, concise, \
and objective.

1. Narrative Construction: reconstruct the sequence of events and actions \
and identify those that shape the narrative of the video.

2. Political Classification: categorize the video as political or \
non-political; if political, add a sub-category such as candidate's \
personal video, campaign speech, protest, political meme, election \
advertisement, or media coverage.

3. Difficult Language: list words and phrases in the transcript or \
metadata that are difficult to translate, ambiguous, or politically \
charged, with interpretations.

4. Key Political Topics: list the major political topics (for example \
immigration, climate change, populism, the war in Ukraine) and describe \
how each is presented.

5. Political Entities: list politicians, parties, movements, and \
organizations featured in the video and describe their role.

6. Sentiment Analysis: classify the sentiment as positive, negative, or \
neutral, identify the target of each sentiment, and justify the \
evaluation.

7. Political Populism: identify populist elements in the sense of \
Laclau's theory: empty signifiers, chains of equivalence, and a people \
versus elite narrative, and how they contribute to the video.

8. Social Contract: describe implied or explicit agreements, obligations, \
or expectations between citizens and political authorities and how they \
shape political behavior.

9. Grievance Politics: list grievances or perceived injustices expressed \
in the video and their potential impact on political mobilization.";

/// Labeled analysis block for one frame.
///
/// Frame indices are 1-based; index i sits at (i-1)*30 seconds of video
/// time, which keeps the labels stable however many frames a clip yields.
#[must_use]
pub fn frame_block(frame_index: usize, description: &str) -> String {
    format!(
        "### Frame {frame_index} at {secs} seconds\n\n{description}",
        secs = elapsed_secs(frame_index) as u64
    )
}

/// Labeled on-screen text block for one frame.
#[must_use]
pub fn ocr_block(frame_index: usize, ocr_text: &str) -> String {
    format!(
        "### On-screen text for frame {frame_index} at {secs} seconds\n\n{ocr_text}",
        secs = elapsed_secs(frame_index) as u64
    )
}

/// Assemble the synthesis user prompt from the three context sections.
#[must_use]
pub fn synthesis_user_prompt(metadata: &str, transcript: &str, frame_context: &str) -> String {
    format!(
        "Data for analysis:\n\n\
         1. Frame analysis and on-screen text results:\n```\n{frame_context}\n```\n\n\
         2. Video metadata:\n```\n{metadata}\n```\n\n\
         3. Speech transcript:\n```\n{transcript}\n```\n\n\
         Task: use the frame analysis, metadata, and transcript to conduct \
         a comprehensive political analysis of the video."
    )
}
