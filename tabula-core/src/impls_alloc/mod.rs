mod smartptr;
mod string;
mod vec;
