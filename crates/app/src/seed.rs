use exam_core::model::{
    AnswerOption, Exam, ExamMeta, ExamSection, Question, QuestionError, QuestionId, QuestionKind,
    SubjectId,
};

/// Small mixed-type exam used by the `seed` command.
pub fn sample_exam(subject_id: SubjectId, minutes: Option<u32>) -> Result<Exam, QuestionError> {
    let questions = vec![
        Question::new(
            QuestionId::new(1),
            "Which planet is closest to the sun?",
            QuestionKind::MultipleChoice {
                options: vec![
                    AnswerOption::new("a", "Venus"),
                    AnswerOption::new("b", "Mercury"),
                    AnswerOption::new("c", "Mars"),
                ],
                correct: "b".into(),
            },
            "Mercury orbits at about 0.39 AU.",
        )?,
        Question::new(
            QuestionId::new(2),
            "Which gas do plants absorb for photosynthesis?",
            QuestionKind::MultipleChoice {
                options: vec![
                    AnswerOption::new("a", "Oxygen"),
                    AnswerOption::new("b", "Nitrogen"),
                    AnswerOption::new("c", "Carbon dioxide"),
                ],
                correct: "c".into(),
            },
            "",
        )?,
        Question::new(
            QuestionId::new(3),
            "Sound travels faster in water than in air.",
            QuestionKind::TrueFalse { correct: true },
            "Roughly 1480 m/s in water against 343 m/s in air.",
        )?,
        Question::new(
            QuestionId::new(4),
            "A spider is an insect.",
            QuestionKind::TrueFalse { correct: false },
            "Spiders are arachnids.",
        )?,
        Question::new(
            QuestionId::new(5),
            "The chemical symbol for sodium is ___.",
            QuestionKind::FillInBlank {
                correct: "Na".into(),
            },
            "From the Latin natrium.",
        )?,
        Question::new(
            QuestionId::new(6),
            "Water freezes at ___ degrees Celsius.",
            QuestionKind::FillInBlank {
                correct: "0".into(),
            },
            "",
        )?,
    ];

    let meta = ExamMeta::new("General science", minutes).with_sections(vec![
        ExamSection::new("Choices", 0, 2),
        ExamSection::new("True or false", 2, 2),
        ExamSection::new("Fill in the blank", 4, 2),
    ]);
    Ok(Exam::new(subject_id, meta, questions))
}
