// Sample catalog loaded at start-up when SEED_SAMPLE_DATA is on.

use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use std::time::Duration;

use crate::models::*;

struct SampleCourse {
    title: &'static str,
    description: &'static str,
    short_description: &'static str,
    image: &'static str,
    instructor: &'static str,
    avatar: &'static str,
    price: i64,
    category: &'static str,
    level: &'static str,
    rating: f64,
    rating_count: u32,
    enrollment_count: u32,
    total_lessons: u32,
    total_hours: u64,
    tags: &'static [&'static str],
    requirements: &'static [&'static str],
    outcomes: &'static [&'static str],
    modules: u32,
}

const SAMPLES: &[SampleCourse] = &[
    SampleCourse {
        title: "Complete Web Development Bootcamp 2024",
        description: "Learn web development from the ground up to a professional level. Covers HTML, CSS, JavaScript, React and Node.js with more than 20 real projects.",
        short_description: "Full-stack web development with HTML, CSS, JavaScript, React and Node.js",
        image: "https://images.unsplash.com/photo-1498050108023-c5249f4df085?w=800",
        instructor: "Dr. Somchai Developer",
        avatar: "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=150",
        price: 1990,
        category: "Web Development",
        level: "Beginner",
        rating: 4.8,
        rating_count: 2547,
        enrollment_count: 15420,
        total_lessons: 156,
        total_hours: 42,
        tags: &["HTML", "CSS", "JavaScript", "React", "Node.js"],
        requirements: &[
            "A computer with an internet connection",
            "No prior programming experience needed",
            "Time and motivation to learn",
        ],
        outcomes: &[
            "Build websites with HTML5 and CSS3",
            "Write JavaScript from the basics to advanced topics",
            "Develop single page applications with React",
            "Create REST APIs with Node.js and Express",
            "Connect to a MongoDB database",
        ],
        modules: 10,
    },
    SampleCourse {
        title: "Machine Learning with Python - From Zero to Hero",
        description: "Start machine learning from the fundamentals and build real projects with Python, Scikit-learn, TensorFlow and Keras.",
        short_description: "Machine learning with Python from the very beginning",
        image: "https://images.unsplash.com/photo-1555949963-aa79dcee981c?w=800",
        instructor: "Wichai AI Expert",
        avatar: "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=150",
        price: 2490,
        category: "Data Science",
        level: "Intermediate",
        rating: 4.9,
        rating_count: 1823,
        enrollment_count: 8765,
        total_lessons: 98,
        total_hours: 28,
        tags: &["Python", "Machine Learning", "TensorFlow", "Deep Learning"],
        requirements: &[
            "Basic Python knowledge",
            "Basic mathematics and statistics",
            "A computer that can run Python",
        ],
        outcomes: &[
            "Understand how machine learning works",
            "Build supervised and unsupervised models",
            "Develop neural networks with TensorFlow",
            "Apply ML to real problems",
        ],
        modules: 8,
    },
    SampleCourse {
        title: "Flutter & Dart - Build iOS and Android Apps",
        description: "Build iOS and Android apps with the Flutter framework. Learn Dart and the widget system while shipping a real app from scratch.",
        short_description: "Cross-platform mobile development with Flutter",
        image: "https://images.unsplash.com/photo-1512941937669-90a1b58e7e9c?w=800",
        instructor: "Pat Mobile Dev",
        avatar: "https://images.unsplash.com/photo-1500648767791-00dcc994a43e?w=150",
        price: 1790,
        category: "Mobile Development",
        level: "Beginner",
        rating: 4.7,
        rating_count: 1456,
        enrollment_count: 6543,
        total_lessons: 120,
        total_hours: 35,
        tags: &["Flutter", "Dart", "iOS", "Android", "Mobile"],
        requirements: &[
            "Basic programming knowledge",
            "A computer that supports the Flutter SDK",
        ],
        outcomes: &[
            "Write Dart",
            "Build UIs with Flutter widgets",
            "Manage application state",
            "Consume REST APIs",
            "Publish to the App Store and Play Store",
        ],
        modules: 12,
    },
    SampleCourse {
        title: "AWS Cloud Practitioner - Certification Prep",
        description: "Prepare for the AWS Certified Cloud Practitioner exam. Learn the essential AWS services and practice with realistic questions.",
        short_description: "Get ready for the AWS Cloud Practitioner certification",
        image: "https://images.unsplash.com/photo-1451187580459-43490279c0fa?w=800",
        instructor: "Prasert Cloud Architect",
        avatar: "https://images.unsplash.com/photo-1519085360753-af0119f7cbe7?w=150",
        price: 990,
        category: "Cloud Computing",
        level: "Beginner",
        rating: 4.6,
        rating_count: 987,
        enrollment_count: 4321,
        total_lessons: 65,
        total_hours: 15,
        tags: &["AWS", "Cloud", "Certification", "DevOps"],
        requirements: &["No prior AWS knowledge needed", "Basic IT knowledge"],
        outcomes: &[
            "Understand AWS cloud concepts",
            "Know the AWS core services",
            "Security and compliance",
            "Pricing and support plans",
        ],
        modules: 6,
    },
    SampleCourse {
        title: "Git and GitHub for Beginners",
        description: "Learn Git and GitHub from the basics: version control, branching and merging, all the way to working with a team.",
        short_description: "A free Git and GitHub course for beginners",
        image: "https://images.unsplash.com/photo-1556075798-4825dfaaf498?w=800",
        instructor: "Nat Developer",
        avatar: "https://images.unsplash.com/photo-1506794778202-cad84cf45f1d?w=150",
        price: 0,
        category: "Development Tools",
        level: "Beginner",
        rating: 4.8,
        rating_count: 3456,
        enrollment_count: 25678,
        total_lessons: 25,
        total_hours: 4,
        tags: &["Git", "GitHub", "Version Control"],
        requirements: &["A computer that can install Git", "No prior knowledge needed"],
        outcomes: &[
            "Version control fundamentals",
            "Everyday Git commands",
            "Working with GitHub",
            "Branching and merging",
            "Pull requests and code review",
        ],
        modules: 5,
    },
    SampleCourse {
        title: "UI/UX Design Masterclass with Figma",
        description: "Learn UI/UX design with Figma, from design principles and prototyping to building a design system.",
        short_description: "Professional UI/UX design with Figma",
        image: "https://images.unsplash.com/photo-1561070791-2526d30994b5?w=800",
        instructor: "Pim UX Designer",
        avatar: "https://images.unsplash.com/photo-1494790108377-be9c29b29330?w=150",
        price: 1590,
        category: "Design",
        level: "Beginner",
        rating: 4.9,
        rating_count: 2134,
        enrollment_count: 9876,
        total_lessons: 85,
        total_hours: 22,
        tags: &["UI", "UX", "Figma", "Design"],
        requirements: &[
            "No design experience needed",
            "A computer that can run Figma",
        ],
        outcomes: &[
            "UI/UX design principles",
            "Use Figma like a pro",
            "Build prototypes and animations",
            "Create a design system",
        ],
        modules: 8,
    },
];

const LESSONS_PER_MODULE: u32 = 3;

/// The published sample catalog, ids 1 through 6, oldest first.
pub fn sample_courses() -> Vec<Course> {
    let now = Utc::now();
    let count = SAMPLES.len() as i64;
    SAMPLES
        .iter()
        .zip(1..)
        .map(|(s, id): (&SampleCourse, CourseId)| {
            let created_at = now - ChronoDuration::days(30 * (count - i64::from(id) + 1));
            Course {
                id,
                title: s.title.into(),
                description: s.description.into(),
                short_description: s.short_description.into(),
                image_url: s.image.into(),
                instructor_id: None,
                instructor_name: s.instructor.into(),
                instructor_avatar: s.avatar.into(),
                price: Decimal::new(s.price, 0),
                category: s.category.into(),
                level: s.level.into(),
                rating: s.rating,
                rating_count: s.rating_count,
                enrollment_count: s.enrollment_count,
                total_lessons: s.total_lessons,
                total_duration: Duration::from_secs(s.total_hours * 3600),
                created_at,
                updated_at: created_at,
                is_published: true,
                tags: to_strings(s.tags),
                requirements: to_strings(s.requirements),
                what_you_will_learn: to_strings(s.outcomes),
                lessons: sample_lessons(id, s.modules),
            }
        })
        .collect()
}

fn to_strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn sample_lessons(course_id: CourseId, modules: u32) -> Vec<Lesson> {
    let mut lessons = Vec::new();
    for module in 1..=modules {
        for part in 1..=LESSONS_PER_MODULE {
            let order = lessons.len() as u32 + 1;
            let id = course_id * 100 + order;
            let is_quiz = part == LESSONS_PER_MODULE;
            lessons.push(Lesson {
                id,
                course_id,
                title: format!("Module {} - Lesson {}", module, part),
                description: format!("Lesson {} of the course", order),
                video_url: "https://sample-videos.com/video.mp4".into(),
                duration: Duration::from_secs(60 * u64::from(10 + (course_id * 7 + order * 11) % 21)),
                order,
                lesson_type: if is_quiz { LessonType::Quiz } else { LessonType::Video },
                is_free_preview: order <= 2,
                quiz: is_quiz.then(|| module_quiz(id, module)),
            });
        }
    }
    lessons
}

fn module_quiz(lesson_id: LessonId, module: u32) -> Quiz {
    let question = |n: u32, kind: QuestionType, prompt: String, options: &[(&str, bool)]| QuizQuestion {
        id: lesson_id * 10 + n,
        prompt,
        kind,
        options: options
            .iter()
            .zip(1..)
            .map(|((text, is_correct), i): (&(&str, bool), u32)| QuizOption {
                id: (lesson_id * 10 + n) * 10 + i,
                text: text.to_string(),
                is_correct: *is_correct,
            })
            .collect(),
        explanation: None,
        points: 1,
        order: n,
    };
    Quiz {
        id: lesson_id,
        lesson_id,
        title: format!("Module {} check", module),
        description: format!("Review what you learned in module {}", module),
        passing_score: 70,
        time_limit_minutes: 0,
        allow_retake: true,
        max_attempts: 3,
        questions: vec![
            question(
                1,
                QuestionType::TrueFalse,
                format!("Module {} builds on the previous module.", module),
                &[("True", module > 1), ("False", module == 1)],
            ),
            question(
                2,
                QuestionType::SingleChoice,
                "Which lesson type ends every module?".into(),
                &[("Video", false), ("Quiz", true), ("Article", false)],
            ),
        ],
    }
}
