//! Database schema
//!
//! Every statement is idempotent so the schema can be applied on each open.

/// Bumped whenever [`SCHEMA`] changes incompatibly
pub const SCHEMA_VERSION: i32 = 1;

/// Tables, uniqueness rules and cascades
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS settings (
    name  TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subject_areas (
    slug TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS courses (
    id          INTEGER PRIMARY KEY,
    title       TEXT NOT NULL UNIQUE,
    short_title TEXT UNIQUE
);

CREATE TABLE IF NOT EXISTS course_subject_areas (
    course_id INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
    slug      TEXT NOT NULL REFERENCES subject_areas(slug) ON DELETE CASCADE,
    PRIMARY KEY (course_id, slug)
);

CREATE TABLE IF NOT EXISTS staff (
    username           TEXT PRIMARY KEY,
    first_name         TEXT NOT NULL,
    last_name          TEXT NOT NULL,
    email              TEXT NOT NULL DEFAULT '',
    role               TEXT NOT NULL DEFAULT 'teacher',
    pastoral_care      INTEGER NOT NULL DEFAULT 0,
    programme_director INTEGER NOT NULL DEFAULT 0,
    main_admin         INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS staff_subject_areas (
    username TEXT NOT NULL REFERENCES staff(username) ON DELETE CASCADE,
    slug     TEXT NOT NULL REFERENCES subject_areas(slug) ON DELETE CASCADE,
    PRIMARY KEY (username, slug)
);

CREATE TABLE IF NOT EXISTS students (
    student_id            TEXT PRIMARY KEY,
    first_name            TEXT NOT NULL,
    last_name             TEXT NOT NULL,
    exam_id               TEXT UNIQUE,
    since                 INTEGER,
    year                  INTEGER,
    is_part_time          INTEGER NOT NULL DEFAULT 0,
    second_part_time_year INTEGER NOT NULL DEFAULT 0,
    email                 TEXT NOT NULL DEFAULT '',
    course_id             INTEGER REFERENCES courses(id) ON DELETE SET NULL,
    qld                   INTEGER NOT NULL DEFAULT 1,
    tutor                 TEXT REFERENCES staff(username) ON DELETE SET NULL,
    notes                 TEXT NOT NULL DEFAULT '',
    active                INTEGER NOT NULL DEFAULT 1,
    lsp                   TEXT,
    permanent_email       TEXT,
    address               TEXT NOT NULL DEFAULT '',
    phone_number          TEXT,
    cell_number           TEXT,
    home_address          TEXT NOT NULL DEFAULT '',
    nalp                  INTEGER NOT NULL DEFAULT 0,
    tier_4                INTEGER NOT NULL DEFAULT 0,
    achieved_degree       INTEGER,
    graduated_in          INTEGER,
    next_year             TEXT
);

CREATE TABLE IF NOT EXISTS modules (
    id             INTEGER PRIMARY KEY,
    code           TEXT NOT NULL,
    year           INTEGER NOT NULL,
    title          TEXT NOT NULL,
    foundational   INTEGER NOT NULL DEFAULT 0,
    nalp           INTEGER NOT NULL DEFAULT 0,
    credits        INTEGER NOT NULL DEFAULT 20,
    eligible       TEXT NOT NULL DEFAULT '1',
    first_session  INTEGER,
    last_session   INTEGER,
    no_teaching_in TEXT,
    UNIQUE (code, year)
);

CREATE TABLE IF NOT EXISTS module_subject_areas (
    module_id INTEGER NOT NULL REFERENCES modules(id) ON DELETE CASCADE,
    slug      TEXT NOT NULL REFERENCES subject_areas(slug) ON DELETE CASCADE,
    PRIMARY KEY (module_id, slug)
);

CREATE TABLE IF NOT EXISTS module_teachers (
    module_id INTEGER NOT NULL REFERENCES modules(id) ON DELETE CASCADE,
    username  TEXT NOT NULL REFERENCES staff(username) ON DELETE CASCADE,
    PRIMARY KEY (module_id, username)
);

CREATE TABLE IF NOT EXISTS assessments (
    id                     INTEGER PRIMARY KEY,
    module_id              INTEGER NOT NULL REFERENCES modules(id) ON DELETE CASCADE,
    title                  TEXT NOT NULL,
    slug                   TEXT NOT NULL,
    value                  INTEGER NOT NULL,
    submission_date        TEXT,
    resit_submission_date  TEXT,
    max_word_count         INTEGER,
    resit_max_word_count   INTEGER,
    group_assessment       INTEGER NOT NULL DEFAULT 0,
    resit_group_assessment INTEGER NOT NULL DEFAULT 0,
    marksheet_type         TEXT,
    resit_marksheet_type   TEXT,
    co_marking             INTEGER NOT NULL DEFAULT 0,
    available              INTEGER NOT NULL DEFAULT 0,
    resit_available        INTEGER NOT NULL DEFAULT 0,
    second_resit_available INTEGER NOT NULL DEFAULT 0,
    qld_resit_available    INTEGER NOT NULL DEFAULT 0,
    UNIQUE (module_id, title),
    UNIQUE (module_id, slug)
);

CREATE TABLE IF NOT EXISTS performances (
    id              INTEGER PRIMARY KEY,
    student_id      TEXT NOT NULL REFERENCES students(student_id) ON DELETE CASCADE,
    module_id       INTEGER NOT NULL REFERENCES modules(id) ON DELETE CASCADE,
    seminar_group   INTEGER,
    belongs_to_year INTEGER,
    average         INTEGER,
    real_average    REAL,
    attendance      TEXT NOT NULL DEFAULT '',
    UNIQUE (student_id, module_id)
);

CREATE TABLE IF NOT EXISTS results (
    id                     INTEGER PRIMARY KEY,
    performance_id         INTEGER NOT NULL REFERENCES performances(id) ON DELETE CASCADE,
    assessment_id          INTEGER NOT NULL REFERENCES assessments(id) ON DELETE CASCADE,
    mark                   INTEGER,
    resit_mark             INTEGER,
    second_resit_mark      INTEGER,
    qld_resit              INTEGER,
    concessions            TEXT NOT NULL DEFAULT 'N',
    second_concessions     TEXT NOT NULL DEFAULT 'N',
    assessment_group       INTEGER,
    resit_assessment_group INTEGER,
    last_modified          TEXT,
    UNIQUE (performance_id, assessment_id)
);

CREATE TABLE IF NOT EXISTS individual_feedback (
    id                    INTEGER PRIMARY KEY,
    result_id             INTEGER NOT NULL REFERENCES results(id) ON DELETE CASCADE,
    attempt               TEXT NOT NULL,
    completed             INTEGER NOT NULL DEFAULT 0,
    marker                TEXT REFERENCES staff(username) ON DELETE SET NULL,
    second_first_marker   TEXT REFERENCES staff(username) ON DELETE SET NULL,
    second_marker         TEXT REFERENCES staff(username) ON DELETE SET NULL,
    marking_date          TEXT,
    deduction             INTEGER,
    deduction_explanation TEXT NOT NULL DEFAULT '',
    part_1_mark           INTEGER,
    part_2_mark           INTEGER,
    submission_date       TEXT,
    comments              TEXT NOT NULL DEFAULT '',
    comments_2            TEXT NOT NULL DEFAULT '',
    UNIQUE (result_id, attempt)
);

CREATE TABLE IF NOT EXISTS individual_feedback_marks (
    feedback_id INTEGER NOT NULL REFERENCES individual_feedback(id) ON DELETE CASCADE,
    category    INTEGER NOT NULL,
    mark        INTEGER NOT NULL,
    PRIMARY KEY (feedback_id, category)
);

CREATE TABLE IF NOT EXISTS group_feedback (
    id             INTEGER PRIMARY KEY,
    assessment_id  INTEGER NOT NULL REFERENCES assessments(id) ON DELETE CASCADE,
    group_no       INTEGER NOT NULL,
    attempt        TEXT NOT NULL,
    marker         TEXT REFERENCES staff(username) ON DELETE SET NULL,
    marking_date   TEXT,
    group_comments TEXT NOT NULL DEFAULT '',
    UNIQUE (assessment_id, group_no, attempt)
);

CREATE TABLE IF NOT EXISTS group_feedback_marks (
    feedback_id INTEGER NOT NULL REFERENCES group_feedback(id) ON DELETE CASCADE,
    category    INTEGER NOT NULL,
    mark        INTEGER NOT NULL,
    PRIMARY KEY (feedback_id, category)
);

CREATE TABLE IF NOT EXISTS group_feedback_parts (
    feedback_id INTEGER NOT NULL REFERENCES group_feedback(id) ON DELETE CASCADE,
    student_id  TEXT NOT NULL REFERENCES students(student_id) ON DELETE CASCADE,
    part        TEXT NOT NULL,
    value       TEXT NOT NULL,
    PRIMARY KEY (feedback_id, student_id, part)
);

CREATE TABLE IF NOT EXISTS tutee_sessions (
    id                 INTEGER PRIMARY KEY,
    tutee              TEXT NOT NULL REFERENCES students(student_id) ON DELETE CASCADE,
    tutor              TEXT NOT NULL REFERENCES staff(username) ON DELETE CASCADE,
    date_of_meet       TEXT NOT NULL,
    notes              TEXT NOT NULL DEFAULT '',
    meeting_took_place INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS performances_by_module ON performances(module_id);
CREATE INDEX IF NOT EXISTS results_by_assessment ON results(assessment_id);
CREATE INDEX IF NOT EXISTS students_by_name ON students(last_name, first_name);
";
